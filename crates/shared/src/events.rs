//! Progress events emitted while a research run is in flight.

use serde::{Deserialize, Serialize};

use crate::research::VerificationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResearchEvent {
    /// Research model call is about to be issued
    Started { model: String },
    /// Research model answered; citations are pre-verification counts
    ModelResponded {
        citations: usize,
        search_queries: usize,
    },
    /// No grounding chunks; citations were synthesized from search queries
    FallbackUsed { count: usize },
    CitationVerified {
        url: String,
        status: VerificationStatus,
        confidence: u8,
    },
    Completed { duration_ms: u64 },
}
