use async_trait::async_trait;

use crate::clients::UpstreamError;

/// Text-in, text-out language model backend.
///
/// `instruction` is the fixed system-style prompt, `input` the literal user text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, instruction: &str, input: &str) -> Result<String, UpstreamError>;
}
