//! Configuration errors surfaced before any research call is made.

/// Startup configuration failures. These are fatal: nothing runs without a
/// usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {var}: set it in the environment or a .env file")]
    MissingCredential { var: &'static str },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}
