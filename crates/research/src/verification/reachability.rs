//! HEAD probes for citation URLs.

use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_HEAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachability {
    pub ok: bool,
    /// `None` when no response was received at all
    pub status: Option<u16>,
}

impl Reachability {
    pub fn unreachable() -> Self {
        Self {
            ok: false,
            status: None,
        }
    }

    pub fn from_status(status: u16) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status: Some(status),
        }
    }
}

/// Anything that can tell whether a URL currently answers.
///
/// Implementations never fail: every problem is reported as unreachable.
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn check(&self, url: &str) -> Reachability;
}

/// Lightweight HTTP HEAD probe that follows redirects.
pub struct HeadProbe {
    client: Client,
}

impl HeadProbe {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkChecker for HeadProbe {
    async fn check(&self, url: &str) -> Reachability {
        let parsed = match Url::parse(url.trim()) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => {
                debug!(url, "not an http(s) url, skipping probe");
                return Reachability::unreachable();
            }
        };
        match self.client.head(parsed).send().await {
            Ok(resp) => Reachability::from_status(resp.status().as_u16()),
            Err(e) => {
                debug!(url, error = %e, "HEAD probe failed");
                Reachability::unreachable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer every connection with the given status line, `hits` times.
    async fn stub_server(status_line: &'static str, extra_headers: String, hits: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for _ in 0..hits {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\n{}Content-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line, extra_headers
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.flush().await;
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_status_classification() {
        assert!(Reachability::from_status(200).ok);
        assert!(Reachability::from_status(204).ok);
        assert!(!Reachability::from_status(404).ok);
        assert!(!Reachability::from_status(500).ok);
        assert_eq!(Reachability::from_status(404).status, Some(404));
    }

    #[tokio::test]
    async fn test_reachable_url() {
        let base = stub_server("200 OK", String::new(), 1).await;
        let probe = HeadProbe::new(DEFAULT_HEAD_TIMEOUT).unwrap();
        let result = probe.check(&format!("{}/page", base)).await;
        assert_eq!(result, Reachability { ok: true, status: Some(200) });
    }

    #[tokio::test]
    async fn test_not_found_keeps_status() {
        let base = stub_server("404 Not Found", String::new(), 1).await;
        let probe = HeadProbe::new(DEFAULT_HEAD_TIMEOUT).unwrap();
        let result = probe.check(&base).await;
        assert_eq!(result, Reachability { ok: false, status: Some(404) });
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let target = stub_server("200 OK", String::new(), 1).await;
        let redirect = stub_server(
            "301 Moved Permanently",
            format!("Location: {}/final\r\n", target),
            1,
        )
        .await;
        let probe = HeadProbe::new(DEFAULT_HEAD_TIMEOUT).unwrap();
        let result = probe.check(&redirect).await;
        assert_eq!(result, Reachability { ok: true, status: Some(200) });
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HeadProbe::new(DEFAULT_HEAD_TIMEOUT).unwrap();
        let result = probe.check(&format!("http://{}", addr)).await;
        assert_eq!(result, Reachability::unreachable());
    }

    #[tokio::test]
    async fn test_malformed_url_is_unreachable() {
        let probe = HeadProbe::new(DEFAULT_HEAD_TIMEOUT).unwrap();
        assert_eq!(probe.check("not a url").await, Reachability::unreachable());
        assert_eq!(probe.check("ftp://example.com/file").await, Reachability::unreachable());
        assert_eq!(probe.check("").await, Reachability::unreachable());
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable() {
        // Accept the connection but never answer.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let probe = HeadProbe::new(Duration::from_millis(200)).unwrap();
        let result = probe.check(&format!("http://{}", addr)).await;
        assert_eq!(result, Reachability::unreachable());
    }
}
