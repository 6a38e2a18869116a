//! Fakes for the model and network seams, shared by the unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use providers::{GroundedResponse, JudgeModel, ResearchModel};
use shared::agent_api::ConversationMessage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::verification::{LinkChecker, Reachability};

/// Link checker answering from a fixed table; unknown URLs are unreachable.
pub struct TableLinks {
    pub table: HashMap<String, Reachability>,
    pub delays: HashMap<String, u64>,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl TableLinks {
    pub fn new(entries: &[(&str, Reachability)]) -> Self {
        Self {
            table: entries.iter().map(|(u, r)| (u.to_string(), *r)).collect(),
            delays: HashMap::new(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, url: &str, millis: u64) -> Self {
        self.delays.insert(url.to_string(), millis);
        self
    }
}

#[async_trait]
impl LinkChecker for TableLinks {
    async fn check(&self, url: &str) -> Reachability {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = self.delays.get(url).copied().unwrap_or(20);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.table.get(url).copied().unwrap_or_else(Reachability::unreachable)
    }
}

pub struct CountingJudge {
    pub reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl CountingJudge {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("model unavailable".to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl JudgeModel for CountingJudge {
    async fn judge(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(|e| anyhow!(e))
    }
}

/// Research model returning a fixed response and recording what it was sent.
pub struct CannedModel {
    pub response: Result<GroundedResponse, String>,
    pub received: Mutex<Vec<Vec<ConversationMessage>>>,
}

impl CannedModel {
    pub fn new(response: GroundedResponse) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(response),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(message.to_string()),
            received: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ResearchModel for CannedModel {
    fn model_id(&self) -> &str {
        "gemini-2.5-pro"
    }

    async fn generate_grounded(&self, messages: &[ConversationMessage]) -> Result<GroundedResponse> {
        self.received.lock().unwrap().push(messages.to_vec());
        self.response.clone().map_err(|e| anyhow!(e))
    }
}
