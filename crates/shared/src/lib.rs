pub mod error;
pub mod events;
pub mod grounding;
pub mod research;

pub mod settings {
    use crate::error::ConfigError;
    use std::env;
    use std::time::Duration;

    pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_RESEARCH_MODEL: &str = "gemini-2.5-pro";
    pub const DEFAULT_RELEVANCE_MODEL: &str = "gemini-2.5-flash";

    /// Everything a research run needs to talk to Gemini and verify citations.
    ///
    /// Built once and handed to the orchestrator, so test and production
    /// credentials can live side by side in one process.
    #[derive(Debug, Clone)]
    pub struct ResearchConfig {
        pub api_key: String,
        pub base_url: String,
        pub research_model: String, // e.g., "gemini-2.5-pro"
        pub relevance_model: String, // e.g., "gemini-2.5-flash"
        /// Upper bound for the single grounded research call
        pub research_timeout: Duration,
        /// Upper bound for each citation HEAD probe
        pub head_timeout: Duration,
        /// Upper bound for each relevance judge call
        pub relevance_timeout: Duration,
        pub max_concurrent_verifications: usize,
        /// Max synthetic citations built from search queries
        pub fallback_limit: usize,
    }

    impl ResearchConfig {
        pub fn new(api_key: impl Into<String>) -> Self {
            Self {
                api_key: api_key.into(),
                base_url: DEFAULT_BASE_URL.into(),
                research_model: DEFAULT_RESEARCH_MODEL.into(),
                relevance_model: DEFAULT_RELEVANCE_MODEL.into(),
                research_timeout: Duration::from_secs(600),
                head_timeout: Duration::from_secs(5),
                relevance_timeout: Duration::from_secs(30),
                max_concurrent_verifications: 5,
                fallback_limit: 3,
            }
        }

        /// Read the configuration from the process environment.
        pub fn from_env() -> Result<Self, ConfigError> {
            Self::from_lookup(|key| env::var(key).ok())
        }

        pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where
            F: Fn(&str) -> Option<String>,
        {
            let api_key = lookup(API_KEY_VAR)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential { var: API_KEY_VAR })?;

            let mut config = Self::new(api_key);
            if let Some(model) = non_empty(lookup("DEEP_RESEARCH_MODEL")) {
                config.research_model = model;
            }
            if let Some(model) = non_empty(lookup("DEEP_RESEARCH_RELEVANCE_MODEL")) {
                config.relevance_model = model;
            }
            if let Some(base) = non_empty(lookup("GEMINI_BASE_URL")) {
                config.base_url = base.trim_end_matches('/').to_string();
            }
            if let Some(raw) = non_empty(lookup("DEEP_RESEARCH_CONCURRENCY")) {
                let parsed: usize = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    var: "DEEP_RESEARCH_CONCURRENCY",
                    value: raw.clone(),
                })?;
                if parsed == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "DEEP_RESEARCH_CONCURRENCY",
                        value: raw,
                    });
                }
                config.max_concurrent_verifications = parsed;
            }
            Ok(config)
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into().trim_end_matches('/').to_string();
            self
        }
    }

    fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Model,
        System,
    }

    impl Role {
        pub fn as_str(&self) -> &'static str {
            match self {
                Role::User => "user",
                Role::Model => "model",
                Role::System => "system",
            }
        }
    }

    /// A prior turn supplied by the caller as conversation context.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConversationMessage {
        pub role: Role,
        pub content: String,
    }

    impl ConversationMessage {
        pub fn new(role: Role, content: impl Into<String>) -> Self {
            Self {
                role,
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self::new(Role::User, content)
        }
    }
}
