use async_trait::async_trait;

use crate::error::Result;

/// A single-shot completion backend.
///
/// Implementations make exactly one request per `complete` call, sent as one
/// user message. Retries, if any, belong to the caller.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier reported in logs and execution records.
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}
