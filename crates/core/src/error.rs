// Error types for the portal core
//
// Decision: Backends report failures as ProviderError; the guard turns every
// one of them into a redirect, so the variants only need to carry a message
// for logging.

use thiserror::Error;

/// Failure reported by an identity provider or profile store backend
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend could not be reached or failed internally
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with data that could not be interpreted
    #[error("Malformed record: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        ProviderError::Unavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ProviderError::Malformed(message.into())
    }
}
