use shared::error::ConfigError;

/// Failures that abort a whole research request.
///
/// Per-citation problems never show up here; they are recorded as issues on
/// the citation instead.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] anyhow::Error),

    #[error("Research model call failed: {0}")]
    Model(#[source] anyhow::Error),
}
