use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl AiError {
    /// True when the model was never reached or its reply envelope was unusable.
    ///
    /// `EmptyResponse` is the only content-level failure: the provider answered
    /// but produced no text.
    pub fn is_transport(&self) -> bool {
        !matches!(self, AiError::EmptyResponse)
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_is_not_transport() {
        assert!(!AiError::EmptyResponse.is_transport());
        assert!(AiError::Network("refused".into()).is_transport());
        assert!(AiError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_transport());
    }
}
