//! Deep research on Gemini with Google Search grounding.
//!
//! A [`DeepResearch`] run sends one grounded request to the research model,
//! turns the grounding metadata into citations and verifies each citation
//! with a HEAD probe, a relevance judge and a domain reputation heuristic.

pub mod citations;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod reputation;
pub mod usage;
pub mod verification;

#[cfg(test)]
mod test_support;

pub use error::ResearchError;
pub use orchestrator::DeepResearch;
pub use verification::{CitationVerifier, HeadProbe, LinkChecker, Reachability, Relevance, RelevanceChecker};
