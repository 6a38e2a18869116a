//! Relevance judging for a single citation.

use providers::JudgeModel;
use shared::research::Citation;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::prompts::build_relevance_prompt;

pub const DEFAULT_RELEVANCE_TIMEOUT: Duration = Duration::from_secs(30);
pub const UNCLEAR_VERDICT: &str = "Unclear relevance verdict";

/// Three-way judge outcome. Each variant carries the judge's short reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relevance {
    Relevant(String),
    NotRelevant(String),
    /// The judge was unavailable or its answer could not be read
    Unknown(String),
}

impl Relevance {
    /// `Some(true)` / `Some(false)` for a verdict, `None` when unknown.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Relevance::Relevant(_) => Some(true),
            Relevance::NotRelevant(_) => Some(false),
            Relevance::Unknown(_) => None,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Relevance::Relevant(r) | Relevance::NotRelevant(r) | Relevance::Unknown(r) => r,
        }
    }
}

const VERDICTS: [&str; 3] = ["RELEVANT", "QUESTIONABLE", "IRRELEVANT"];

/// Read a judge reply: verdict on the first line, reason on the next.
///
/// The first line must be a bare verdict word, ignoring case and surrounding
/// markdown or punctuation, optionally followed by `:` or `-` and a reason.
/// Anything else ("NOT RELEVANT", "Partially relevant", "RELEVANT?") is
/// unclear.
pub fn parse_verdict(raw: &str) -> Relevance {
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = match lines.next() {
        Some(line) => line.trim_matches(|c: char| !c.is_alphanumeric()),
        None => return Relevance::Unknown(UNCLEAR_VERDICT.to_string()),
    };
    let next_line = lines.next();

    for verdict in VERDICTS {
        let head = match first.get(..verdict.len()) {
            Some(head) if head.eq_ignore_ascii_case(verdict) => head,
            _ => continue,
        };
        let rest = first[head.len()..].trim_start_matches(|c: char| c == '*' || c == '"' || c.is_whitespace());
        let inline_reason = if rest.is_empty() {
            ""
        } else if let Some(reason) = rest.strip_prefix(':').or_else(|| rest.strip_prefix('-')) {
            reason.trim()
        } else {
            break;
        };
        let reason = next_line.unwrap_or(inline_reason).to_string();
        return match verdict {
            "RELEVANT" => Relevance::Relevant(reason),
            _ => Relevance::NotRelevant(reason),
        };
    }
    Relevance::Unknown(UNCLEAR_VERDICT.to_string())
}

/// Asks the judge model whether a citation supports the answer.
#[derive(Clone)]
pub struct RelevanceChecker {
    judge: Arc<dyn JudgeModel>,
    timeout: Duration,
}

impl RelevanceChecker {
    pub fn new(judge: Arc<dyn JudgeModel>) -> Self {
        Self {
            judge,
            timeout: DEFAULT_RELEVANCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Never fails; judge errors and timeouts come back as `Unknown`.
    pub async fn check(&self, question: &str, answer: &str, citation: &Citation) -> Relevance {
        let prompt = build_relevance_prompt(question, answer, citation);
        match tokio::time::timeout(self.timeout, self.judge.judge(&prompt)).await {
            Ok(Ok(reply)) => parse_verdict(&reply),
            Ok(Err(e)) => {
                warn!(url = %citation.url, error = %e, "relevance judge failed");
                Relevance::Unknown(format!("Relevance check failed: {}", e))
            }
            Err(_) => {
                warn!(url = %citation.url, "relevance judge timed out");
                Relevance::Unknown(format!(
                    "Relevance check failed: timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
        }
    }
}
