//! End-to-end deep research: prompt, grounded model call, citation
//! collection, verification, result assembly.

use providers::{GeminiClient, JudgeModel, ResearchModel};
use shared::agent_api::ConversationMessage;
use shared::events::ResearchEvent;
use shared::research::{ResearchMetadata, ResearchResult};
use shared::settings::ResearchConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

use crate::citations::{collect_citations, DEFAULT_FALLBACK_LIMIT};
use crate::error::ResearchError;
use crate::prompts::build_research_prompt;
use crate::usage::estimate_cost;
use crate::verification::{
    CitationVerifier, HeadProbe, LinkChecker, RelevanceChecker, DEFAULT_MAX_CONCURRENT,
};

/// Runs research requests against one model configuration.
pub struct DeepResearch {
    model: Arc<dyn ResearchModel>,
    links: Arc<dyn LinkChecker>,
    relevance: RelevanceChecker,
    max_concurrent: usize,
    fallback_limit: usize,
    event_sender: Option<mpsc::UnboundedSender<ResearchEvent>>,
}

impl DeepResearch {
    /// Gemini research + judge models and a HEAD probe, all from `config`.
    pub fn new(config: &ResearchConfig) -> Result<Self, ResearchError> {
        let model = GeminiClient::for_research(config).map_err(ResearchError::Client)?;
        let judge = GeminiClient::for_judge(config).map_err(ResearchError::Client)?;
        let probe = HeadProbe::new(config.head_timeout).map_err(|e| ResearchError::Client(e.into()))?;

        Ok(Self::with_components(Arc::new(model), Arc::new(judge), Arc::new(probe))
            .with_relevance_timeout(config.relevance_timeout)
            .with_concurrency(config.max_concurrent_verifications)
            .with_fallback_limit(config.fallback_limit))
    }

    /// Assemble from explicit parts (alternate providers, tests).
    pub fn with_components(
        model: Arc<dyn ResearchModel>,
        judge: Arc<dyn JudgeModel>,
        links: Arc<dyn LinkChecker>,
    ) -> Self {
        Self {
            model,
            links,
            relevance: RelevanceChecker::new(judge),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            fallback_limit: DEFAULT_FALLBACK_LIMIT,
            event_sender: None,
        }
    }

    pub fn with_relevance_timeout(mut self, timeout: Duration) -> Self {
        self.relevance = self.relevance.with_timeout(timeout);
        self
    }

    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_fallback_limit(mut self, limit: usize) -> Self {
        self.fallback_limit = limit;
        self
    }

    pub fn with_events(mut self, event_sender: mpsc::UnboundedSender<ResearchEvent>) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Research `question` and return the answer with verified citations.
    ///
    /// Only a failed research model call is an error. Citation problems are
    /// recorded on the citations themselves.
    pub async fn run(
        &self,
        question: &str,
        website_context: Option<&str>,
        context_messages: &[ConversationMessage],
    ) -> Result<ResearchResult, ResearchError> {
        let start = Instant::now();
        let model_id = self.model.model_id().to_string();

        let prompt = build_research_prompt(question, website_context);
        let mut messages: Vec<ConversationMessage> = context_messages.to_vec();
        messages.push(ConversationMessage::user(prompt));

        info!(
            model = %model_id,
            prior_turns = context_messages.len(),
            has_context = website_context.is_some(),
            "starting deep research"
        );
        self.send_event(ResearchEvent::Started {
            model: model_id.clone(),
        });

        let response = self
            .model
            .generate_grounded(&messages)
            .await
            .map_err(ResearchError::Model)?;

        let grounding = response.grounding.unwrap_or_default();
        let (citations, used_fallback) = collect_citations(&grounding, self.fallback_limit);
        info!(
            chars = response.text.len(),
            citations = citations.len(),
            search_queries = grounding.web_search_queries.len(),
            "research model responded"
        );
        self.send_event(ResearchEvent::ModelResponded {
            citations: citations.len(),
            search_queries: grounding.web_search_queries.len(),
        });
        if used_fallback {
            info!(count = citations.len(), "no grounding chunks, using search query fallback");
            self.send_event(ResearchEvent::FallbackUsed {
                count: citations.len(),
            });
        }

        let verifier = self.verifier();
        let verified = verifier.verify_all(question, &response.text, citations).await;

        let estimated_cost_usd = response.usage.as_ref().map(|u| estimate_cost(&model_id, u));
        let result = ResearchResult {
            content: response.text,
            citations: verified,
            metadata: ResearchMetadata {
                model: model_id,
                grounding_supports: grounding.grounding_supports.len(),
                search_queries: grounding.web_search_queries,
                usage: response.usage,
                estimated_cost_usd,
            },
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(duration_ms, citations = result.citations.len(), "deep research complete");
        self.send_event(ResearchEvent::Completed { duration_ms });
        Ok(result)
    }

    fn verifier(&self) -> CitationVerifier {
        let verifier = CitationVerifier::new(self.links.clone(), self.relevance.clone())
            .with_concurrency(self.max_concurrent);
        match &self.event_sender {
            Some(sender) => verifier.with_events(sender.clone()),
            None => verifier,
        }
    }

    fn send_event(&self, event: ResearchEvent) {
        if let Some(ref sender) = self.event_sender {
            // Ignore send errors (receiver may have dropped)
            let _ = sender.send(event);
        }
    }
}
