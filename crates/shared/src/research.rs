//! Result types for a deep research run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grounding::UsageMetadata;

/// A single source reference attributed to part of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub original_url: Option<String>,
}

impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: None,
            original_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Coarse verification outcome. Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Failed,
    Warning,
    Valid,
}

impl VerificationStatus {
    pub const VALID_THRESHOLD: u8 = 80;
    pub const WARNING_THRESHOLD: u8 = 50;

    /// Verdict for a clamped confidence. Unreachable sources always fail.
    pub fn from_score(confidence: u8, url_accessible: bool) -> Self {
        if url_accessible && confidence >= Self::VALID_THRESHOLD {
            VerificationStatus::Valid
        } else if url_accessible && confidence >= Self::WARNING_THRESHOLD {
            VerificationStatus::Warning
        } else {
            VerificationStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Valid => "valid",
            VerificationStatus::Warning => "warning",
            VerificationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    pub url_accessible: bool,
    pub http_status: Option<u16>,
    pub content_relevant: Option<bool>,
    /// Always within 0..=100
    pub confidence: u8,
    pub issues: Vec<String>,
}

/// A citation together with the outcome of verifying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCitation {
    #[serde(flatten)]
    pub citation: Citation,
    pub verified: bool,
    pub verification_status: VerificationStatus,
    pub verification_details: VerificationDetails,
}

impl VerifiedCitation {
    pub fn new(citation: Citation, details: VerificationDetails) -> Self {
        let status = VerificationStatus::from_score(details.confidence, details.url_accessible);
        Self {
            citation,
            verified: status == VerificationStatus::Valid,
            verification_status: status,
            verification_details: details,
        }
    }

    pub fn confidence(&self) -> u8 {
        self.verification_details.confidence
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchMetadata {
    pub model: String,
    pub grounding_supports: usize,
    pub search_queries: Vec<String>,
    pub usage: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
}

/// Terminal output of a research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub content: String,
    /// Completion order, not extraction order
    pub citations: Vec<VerifiedCitation>,
    pub metadata: ResearchMetadata,
}

impl ResearchResult {
    pub fn count_by_status(&self, status: VerificationStatus) -> usize {
        self.citations
            .iter()
            .filter(|c| c.verification_status == status)
            .count()
    }
}
