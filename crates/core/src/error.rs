use std::time::Duration;

use async_openai::error::OpenAIError;

/// Failures of a single generation call or of model initialization.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The credential is missing or cannot be used to configure a client.
    #[error("Invalid API credential: {0}")]
    InvalidCredential(String),
    /// The session has no model handle, usually because initialization failed.
    #[error("Generation model is not available for this session")]
    ModelUnavailable,
    /// Transport, quota or request-building failure reported by the API client.
    #[error("Generation API error: {0}")]
    Api(#[from] OpenAIError),
    /// The API answered but the response carried no text.
    #[error("Generation API returned an empty response")]
    EmptyResponse,
    /// The call did not resolve within the configured deadline.
    #[error("Generation call timed out after {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout(_))
    }
}
