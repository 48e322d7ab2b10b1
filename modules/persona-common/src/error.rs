use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("No posts or comments found for u/{0} (empty corpus)")]
    EmptyCorpus(String),

    #[error("Model transport error: {0}")]
    ModelTransport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
