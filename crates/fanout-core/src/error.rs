use thiserror::Error;

/// Core error type shared across fanout crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter set received the same key twice.
    #[error("duplicate parameter key: {0}")]
    DuplicateParam(String),
    /// A parameter set lacks a key the caller requires.
    #[error("missing parameter key: {0}")]
    MissingParam(String),
    /// A label selector is not well formed.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    /// Registry records violate internal invariants.
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),
}

/// Convenience alias for results returned by fanout crates.
pub type Result<T> = std::result::Result<T, Error>;
