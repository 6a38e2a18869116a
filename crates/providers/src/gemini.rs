use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::{ConversationMessage, Role};
use shared::grounding::{GroundingMetadata, UsageMetadata};
use shared::settings::ResearchConfig;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{GroundedResponse, JudgeModel, ResearchModel};

const ERROR_BODY_LIMIT: usize = 800;

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
struct EmptyConfig {}

/// A tool capability enabled on the request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<EmptyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_context: Option<EmptyConfig>,
}

impl GeminiTool {
    pub fn google_search() -> Self {
        Self {
            google_search: Some(EmptyConfig {}),
            ..Self::default()
        }
    }

    pub fn url_context() -> Self {
        Self {
            url_context: Some(EmptyConfig {}),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

/// Sampling parameters, tools, and timeout for one kind of call.
#[derive(Debug, Clone)]
pub struct GenerationProfile {
    pub temperature: f32,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
    pub tools: Vec<GeminiTool>,
    pub timeout: Duration,
}

impl GenerationProfile {
    /// Multi-step agentic search: web search plus URL reading, long budget.
    pub fn research(timeout: Duration) -> Self {
        Self {
            temperature: 0.2,
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: 32_768,
            tools: vec![GeminiTool::google_search(), GeminiTool::url_context()],
            timeout,
        }
    }

    /// Near-deterministic short classification.
    pub fn judge(timeout: Duration) -> Self {
        Self {
            temperature: 0.1,
            top_k: None,
            top_p: None,
            max_output_tokens: 128,
            tools: Vec::new(),
            timeout,
        }
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    profile: GenerationProfile,
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        profile: GenerationProfile,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("No Gemini API key configured"));
        }
        Ok(Self {
            http: Client::builder().build()?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.trim_start_matches("models/").to_string(),
            profile,
        })
    }

    /// Client for the grounded research call.
    pub fn for_research(config: &ResearchConfig) -> Result<Self> {
        Self::new(
            &config.api_key,
            &config.base_url,
            &config.research_model,
            GenerationProfile::research(config.research_timeout),
        )
    }

    /// Client for per-citation relevance judging.
    pub fn for_judge(config: &ResearchConfig) -> Result<Self> {
        Self::new(
            &config.api_key,
            &config.base_url,
            &config.relevance_model,
            GenerationProfile::judge(config.relevance_timeout),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, messages: &[ConversationMessage]) -> GeminiRequest {
        let mut system_instruction = None;
        let mut contents: Vec<GeminiContent> = Vec::new();
        for m in messages {
            if m.role == Role::System {
                // Gemini only accepts "user" | "model" turns; system text rides
                // in systemInstruction. Later system messages replace earlier ones.
                system_instruction = Some(GeminiContent {
                    role: None,
                    parts: vec![GeminiPart {
                        text: m.content.clone(),
                    }],
                });
            } else {
                contents.push(GeminiContent {
                    role: Some(m.role.as_str().to_string()),
                    parts: vec![GeminiPart {
                        text: m.content.clone(),
                    }],
                });
            }
        }
        GeminiRequest {
            contents,
            system_instruction,
            tools: self.profile.tools.clone(),
            generation_config: self.profile.generation_config(),
        }
    }

    pub async fn generate(&self, messages: &[ConversationMessage]) -> Result<GroundedResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let req = self.build_request(messages);
        debug!(
            model = %self.model,
            turns = req.contents.len(),
            tools = req.tools.len(),
            "sending Gemini generateContent request"
        );
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.profile.timeout)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            warn!(model = %self.model, %status, "Gemini request failed");
            if body.is_empty() {
                return Err(anyhow!("gemini error: {}", status));
            }
            return Err(anyhow!("gemini error: {}\n{}", status, truncate(body, ERROR_BODY_LIMIT)));
        }
        let body: GeminiResponse = resp.json().await?;
        let grounded = into_grounded(body);
        debug!(
            model = %self.model,
            chars = grounded.text.len(),
            grounded = grounded.grounding.is_some(),
            "Gemini response received"
        );
        Ok(grounded)
    }
}

fn into_grounded(body: GeminiResponse) -> GroundedResponse {
    let first = body.candidates.into_iter().next();
    let (text, grounding) = match first {
        Some(candidate) => {
            let text = candidate
                .content
                .map(|c| {
                    c.parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();
            (text, candidate.grounding_metadata)
        }
        None => (String::new(), None),
    };
    GroundedResponse {
        text: text.trim().to_string(),
        grounding,
        usage: body.usage_metadata,
    }
}

fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl ResearchModel for GeminiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_grounded(&self, messages: &[ConversationMessage]) -> Result<GroundedResponse> {
        self.generate(messages).await
    }
}

#[async_trait]
impl JudgeModel for GeminiClient {
    async fn judge(&self, prompt: &str) -> Result<String> {
        let response = self.generate(&[ConversationMessage::user(prompt)]).await?;
        Ok(response.text)
    }
}
