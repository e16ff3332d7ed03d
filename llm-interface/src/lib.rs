//! Text generation for the yoga chat assistant.

pub mod chat;
pub mod gemini;

pub use chat::{build_prompt, ChatAssistant, FALLBACK_MESSAGE, SYSTEM_PROMPT};
pub use gemini::GeminiProvider;

use std::sync::Arc;
use yogamatch_core::CoreError;

/// A remote text-generation model: prompt in, response text out.
pub trait LlmProvider {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, CoreError>;
}

impl<T: LlmProvider> LlmProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, CoreError> {
        (**self).generate(prompt).await
    }
}
