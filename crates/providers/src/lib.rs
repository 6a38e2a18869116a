//! Model providers for deep research.
//!
//! The research pipeline only sees the two traits below; `GeminiClient`
//! implements both against the Gemini REST API.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use shared::agent_api::ConversationMessage;
use shared::grounding::{GroundingMetadata, UsageMetadata};

pub use gemini::{GeminiClient, GenerationProfile};

/// What the research model hands back: text plus the evidence behind it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundedResponse {
    pub text: String,
    /// Grounding attached to the first candidate, if any
    pub grounding: Option<GroundingMetadata>,
    pub usage: Option<UsageMetadata>,
}

/// A model that can search the web and read URLs while answering.
#[async_trait]
pub trait ResearchModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn generate_grounded(&self, messages: &[ConversationMessage]) -> Result<GroundedResponse>;
}

/// A small, low-temperature model used for short classification prompts.
#[async_trait]
pub trait JudgeModel: Send + Sync {
    async fn judge(&self, prompt: &str) -> Result<String>;
}
