use thiserror::Error;

/// Top-level error type shared by OGM components.
#[derive(Error, Debug)]
pub enum OgmError {
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}
