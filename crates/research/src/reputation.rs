//! Static domain reputation used to nudge citation confidence.
//!
//! Matching is a case-insensitive substring test on the raw URL. Low-quality
//! hosts are checked first and win over any trusted fragment.

/// Free blog hosts and personal publishing pages.
const LOW_QUALITY_FRAGMENTS: &[&str] = &[
    "blogspot.com",
    "wordpress.com/free",
    "wixsite.com",
    "medium.com/@",
];

/// Government and education fragments plus established outlets.
const TRUSTED_FRAGMENTS: &[&str] = &[
    "gov",
    ".edu",
    "nytimes.com",
    "wsj.com",
    "forbes.com",
    "bloomberg.com",
    "techcrunch.com",
    "wired.com",
    "theverge.com",
    "harvard.edu",
    "stanford.edu",
];

pub const LOW_QUALITY_PENALTY: f64 = -20.0;
pub const TRUSTED_BONUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reputation {
    Trusted,
    Neutral,
    LowQuality,
}

impl Reputation {
    /// Classify a raw (not normalized) URL.
    pub fn of(url: &str) -> Self {
        let url_lower = url.to_lowercase();
        if LOW_QUALITY_FRAGMENTS.iter().any(|d| url_lower.contains(d)) {
            Reputation::LowQuality
        } else if TRUSTED_FRAGMENTS.iter().any(|d| url_lower.contains(d)) {
            Reputation::Trusted
        } else {
            Reputation::Neutral
        }
    }

    /// Confidence adjustment for this reputation.
    pub fn score(&self) -> f64 {
        match self {
            Reputation::Trusted => TRUSTED_BONUS,
            Reputation::Neutral => 0.0,
            Reputation::LowQuality => LOW_QUALITY_PENALTY,
        }
    }
}

/// Signed confidence bonus for a URL: -20, 0 or +10.
pub fn reputation_score(url: &str) -> f64 {
    Reputation::of(url).score()
}
