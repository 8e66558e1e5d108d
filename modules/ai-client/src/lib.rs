pub mod azure_openai;
pub mod error;
pub mod gemini;
pub mod openrouter;
pub mod retry;
pub mod traits;

pub use azure_openai::AzureOpenAi;
pub use error::ProviderError;
pub use gemini::Gemini;
pub use openrouter::OpenRouter;
pub use traits::{Generation, GenerationProvider};

/// System message for chat-completions backends. The schema-constrained
/// instructions live in the user prompt; this only pins the output mode.
pub(crate) const STRICT_JSON_SYSTEM: &str = "You are a strict JSON generator.";
