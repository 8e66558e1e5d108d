use async_trait::async_trait;

use crate::error::ProviderError;

/// One completed generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    /// Provider-reported token usage, passed through untouched.
    pub usage: serde_json::Value,
    pub model_name: String,
}

/// Capability interface over generation backends. One implementation per
/// provider, selected by configuration at startup. Implementations own their
/// retry policy; callers treat every error as final for that call.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stable provider identifier recorded in output metadata.
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str, request_id: &str)
        -> Result<Generation, ProviderError>;
}
