//! Citation verification: reachability, relevance and reputation folded into
//! one confidence score and verdict per citation.
//!
//! Citations are verified concurrently with a fixed cap on how many run at
//! once. Results come back in completion order, not input order.

pub mod reachability;
pub mod relevance;

use futures::stream::{self, StreamExt};
use shared::events::ResearchEvent;
use shared::research::{Citation, VerificationDetails, VerifiedCitation};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::reputation::{reputation_score, Reputation};
pub use reachability::{HeadProbe, LinkChecker, Reachability};
pub use relevance::{parse_verdict, Relevance, RelevanceChecker};

pub const DEFAULT_MAX_CONCURRENT: usize = 5;

const BASE_CONFIDENCE: f64 = 100.0;
const UNREACHABLE_PENALTY: f64 = 50.0;
const NOT_RELEVANT_PENALTY: f64 = 30.0;
const DEFAULT_NOT_RELEVANT_ISSUE: &str = "Model flagged citation as questionable";

/// Combine the individual checks into a verified citation.
///
/// `relevance` is `None` when the check was skipped (unreachable URL).
pub fn assess(
    citation: Citation,
    reachability: Reachability,
    relevance: Option<Relevance>,
) -> VerifiedCitation {
    let mut issues = Vec::new();
    let mut confidence = BASE_CONFIDENCE;

    if !reachability.ok {
        let status = reachability
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "no response".to_string());
        issues.push(format!("HEAD request failed ({})", status));
        confidence -= UNREACHABLE_PENALTY;
    }

    let content_relevant = relevance.as_ref().and_then(Relevance::as_flag);
    match &relevance {
        Some(Relevance::NotRelevant(reason)) => {
            let reason = reason.trim();
            issues.push(if reason.is_empty() {
                DEFAULT_NOT_RELEVANT_ISSUE.to_string()
            } else {
                reason.to_string()
            });
            confidence -= NOT_RELEVANT_PENALTY;
        }
        // No penalty; the explanation is still worth surfacing.
        Some(Relevance::Unknown(reason)) => issues.push(reason.clone()),
        Some(Relevance::Relevant(_)) | None => {}
    }

    confidence += reputation_score(&citation.url);

    let details = VerificationDetails {
        url_accessible: reachability.ok,
        http_status: reachability.status,
        content_relevant,
        confidence: clamp_confidence(confidence),
        issues,
    };
    VerifiedCitation::new(citation, details)
}

/// Clamp to 0..=100 and floor to an integer.
pub fn clamp_confidence(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).floor() as u8
}

/// Runs every check for a batch of citations with bounded concurrency.
pub struct CitationVerifier {
    links: Arc<dyn LinkChecker>,
    relevance: RelevanceChecker,
    max_concurrent: usize,
    event_sender: Option<mpsc::UnboundedSender<ResearchEvent>>,
}

impl CitationVerifier {
    pub fn new(links: Arc<dyn LinkChecker>, relevance: RelevanceChecker) -> Self {
        Self {
            links,
            relevance,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            event_sender: None,
        }
    }

    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_events(mut self, event_sender: mpsc::UnboundedSender<ResearchEvent>) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Verify one citation. Relevance is only asked for reachable URLs.
    pub async fn verify_one(&self, question: &str, answer: &str, citation: Citation) -> VerifiedCitation {
        let reachability = self.links.check(&citation.url).await;
        let relevance = if reachability.ok {
            Some(self.relevance.check(question, answer, &citation).await)
        } else {
            None
        };
        let relevance_reason = relevance
            .as_ref()
            .map_or("skipped (unreachable)", Relevance::reason)
            .to_string();
        let verified = assess(citation, reachability, relevance);
        debug!(
            url = %verified.citation.url,
            status = %verified.verification_status,
            confidence = verified.confidence(),
            reputation = ?Reputation::of(&verified.citation.url),
            relevance = %relevance_reason,
            "citation verified"
        );
        self.send_event(ResearchEvent::CitationVerified {
            url: verified.citation.url.clone(),
            status: verified.verification_status,
            confidence: verified.confidence(),
        });
        verified
    }

    /// Verify all citations, at most `max_concurrent` at a time.
    pub async fn verify_all(
        &self,
        question: &str,
        answer: &str,
        citations: Vec<Citation>,
    ) -> Vec<VerifiedCitation> {
        if citations.is_empty() {
            return Vec::new();
        }
        info!(count = citations.len(), max_concurrent = self.max_concurrent, "verifying citations");
        stream::iter(citations)
            .map(|citation| self.verify_one(question, answer, citation))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await
    }

    fn send_event(&self, event: ResearchEvent) {
        if let Some(ref sender) = self.event_sender {
            // Ignore send errors (receiver may have dropped)
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingJudge, TableLinks};
    use shared::research::VerificationStatus;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    fn ok() -> Reachability {
        Reachability::from_status(200)
    }

    fn verifier(links: Arc<TableLinks>, judge: Arc<CountingJudge>) -> CitationVerifier {
        CitationVerifier::new(links, RelevanceChecker::new(judge))
    }

    #[test]
    fn test_confidence_always_within_bounds() {
        let urls = [
            "https://example.com",
            "https://agency.gov/report",
            "https://someone.blogspot.com",
        ];
        let reachabilities = [ok(), Reachability::from_status(404), Reachability::unreachable()];
        let relevances = [
            None,
            Some(Relevance::Relevant(String::new())),
            Some(Relevance::NotRelevant("off topic".into())),
            Some(Relevance::Unknown("Unclear relevance verdict".into())),
        ];
        for url in urls {
            for reach in reachabilities {
                for relevance in relevances.iter().cloned() {
                    let verified = assess(Citation::new("t", url), reach, relevance);
                    assert!(verified.confidence() <= 100);
                    assert_eq!(
                        verified.verification_status,
                        VerificationStatus::from_score(verified.confidence(), reach.ok)
                    );
                }
            }
        }
    }

    #[test]
    fn test_clamp_floors_and_bounds() {
        assert_eq!(clamp_confidence(110.0), 100);
        assert_eq!(clamp_confidence(-40.0), 0);
        assert_eq!(clamp_confidence(79.9), 79);
        assert_eq!(clamp_confidence(f64::NAN), 0);
    }

    #[test]
    fn test_trusted_bonus_is_capped() {
        let verified = assess(
            Citation::new("t", "https://www.nytimes.com/a"),
            ok(),
            Some(Relevance::Relevant(String::new())),
        );
        assert_eq!(verified.confidence(), 100);
        assert!(verified.verified);
    }

    #[test]
    fn test_not_relevant_records_reason_and_penalty() {
        let verified = assess(
            Citation::new("t", "https://example.com"),
            ok(),
            Some(Relevance::NotRelevant("Different industry".into())),
        );
        assert_eq!(verified.confidence(), 70);
        assert_eq!(verified.verification_status, VerificationStatus::Warning);
        assert_eq!(verified.verification_details.issues, vec!["Different industry"]);
        assert_eq!(verified.verification_details.content_relevant, Some(false));

        let verified = assess(
            Citation::new("t", "https://example.com"),
            ok(),
            Some(Relevance::NotRelevant("  ".into())),
        );
        assert_eq!(verified.verification_details.issues, vec![DEFAULT_NOT_RELEVANT_ISSUE]);
    }

    #[test]
    fn test_unknown_relevance_has_no_penalty() {
        let verified = assess(
            Citation::new("t", "https://example.com"),
            ok(),
            Some(Relevance::Unknown("Relevance check failed: boom".into())),
        );
        assert_eq!(verified.confidence(), 100);
        assert_eq!(verified.verification_status, VerificationStatus::Valid);
        assert_eq!(verified.verification_details.content_relevant, None);
        assert_eq!(verified.verification_details.issues, vec!["Relevance check failed: boom"]);
    }

    #[test]
    fn test_http_error_status_is_reported() {
        let verified = assess(
            Citation::new("t", "https://agency.gov/x"),
            Reachability::from_status(403),
            None,
        );
        assert_eq!(verified.verification_details.issues, vec!["HEAD request failed (403)"]);
        assert_eq!(verified.verification_details.http_status, Some(403));
        // 100 - 50 + 10: numerically a warning, but unreachable always fails.
        assert_eq!(verified.confidence(), 60);
        assert_eq!(verified.verification_status, VerificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let links = Arc::new(TableLinks::new(&[]));
        let judge = CountingJudge::new("RELEVANT\nx");
        let verified = verifier(links.clone(), judge.clone())
            .verify_all("q", "a", Vec::new())
            .await;
        assert!(verified.is_empty());
        assert_eq!(links.calls.load(Ordering::SeqCst), 0);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_url_skips_relevance() {
        let links = Arc::new(TableLinks::new(&[]));
        let judge = CountingJudge::new("RELEVANT\nx");
        let verified = verifier(links, judge.clone())
            .verify_all("q", "a", vec![Citation::new("Dead", "https://dead.example/page")])
            .await;

        assert_eq!(verified.len(), 1);
        let details = &verified[0].verification_details;
        assert!(!details.url_accessible);
        assert_eq!(details.http_status, None);
        assert_eq!(details.content_relevant, None);
        assert!(details.issues[0].contains("HEAD request failed"));
        assert_eq!(verified[0].verification_status, VerificationStatus::Failed);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_judge_failure_does_not_affect_others() {
        let links = Arc::new(TableLinks::new(&[
            ("https://a.example", ok()),
            ("https://b.example", ok()),
        ]));
        let verified = verifier(links, CountingJudge::failing())
            .verify_all(
                "q",
                "a",
                vec![
                    Citation::new("A", "https://a.example"),
                    Citation::new("B", "https://b.example"),
                ],
            )
            .await;
        assert_eq!(verified.len(), 2);
        for v in &verified {
            assert_eq!(v.verification_details.content_relevant, None);
            assert_eq!(v.confidence(), 100);
            assert_eq!(
                v.verification_details.issues,
                vec!["Relevance check failed: model unavailable"]
            );
        }
    }

    #[tokio::test]
    async fn test_output_is_permutation_of_input_in_completion_order() {
        let links = TableLinks::new(&[
            ("https://slow.example", ok()),
            ("https://fast.example", ok()),
            ("https://mid.example", ok()),
        ])
        .with_delay("https://slow.example", 300)
        .with_delay("https://fast.example", 10)
        .with_delay("https://mid.example", 100);
        let citations = vec![
            Citation::new("Slow", "https://slow.example"),
            Citation::new("Fast", "https://fast.example"),
            Citation::new("Mid", "https://mid.example"),
        ];

        let verified = verifier(Arc::new(links), CountingJudge::new("RELEVANT\nok"))
            .verify_all("q", "a", citations.clone())
            .await;

        let input: HashSet<String> = citations.iter().map(|c| c.url.clone()).collect();
        let output: HashSet<String> = verified.iter().map(|v| v.citation.url.clone()).collect();
        assert_eq!(verified.len(), citations.len());
        assert_eq!(input, output);
        // The slow probe finishes last even though it was submitted first.
        assert_eq!(verified.last().unwrap().citation.title, "Slow");
    }

    #[tokio::test]
    async fn test_concurrency_is_capped_at_five() {
        let entries: Vec<(String, Reachability)> = (0..12)
            .map(|i| (format!("https://site{}.example", i), ok()))
            .collect();
        let refs: Vec<(&str, Reachability)> = entries.iter().map(|(u, r)| (u.as_str(), *r)).collect();
        let links = Arc::new(TableLinks::new(&refs));
        let citations = entries
            .iter()
            .map(|(u, _)| Citation::new("t", u.clone()))
            .collect();

        let verified = verifier(links.clone(), CountingJudge::new("RELEVANT\nok"))
            .verify_all("q", "a", citations)
            .await;

        assert_eq!(verified.len(), 12);
        let peak = links.peak.load(Ordering::SeqCst);
        assert!(peak <= DEFAULT_MAX_CONCURRENT, "peak {peak}");
        assert!(peak > 1, "verifications did not overlap");
    }

    #[tokio::test]
    async fn test_events_are_emitted_per_citation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let links = Arc::new(TableLinks::new(&[("https://a.example", ok())]));
        let verified = verifier(links, CountingJudge::new("RELEVANT\nok"))
            .with_events(tx)
            .verify_all("q", "a", vec![Citation::new("A", "https://a.example")])
            .await;
        assert_eq!(verified.len(), 1);

        let event = rx.recv().await;
        assert_eq!(
            event,
            Some(ResearchEvent::CitationVerified {
                url: "https://a.example".into(),
                status: VerificationStatus::Valid,
                confidence: 100,
            })
        );
    }
}
