use crate::LlmProvider;
use embedding_engine::TextEmbedder;
use recommender::ContextRetriever;
use std::time::Duration;
use tracing::{debug, info, warn};
use yogamatch_core::{
    CoreError, ErrorExt, ErrorRecovery, GenerationConfig, LlmError, RecoveryStrategy,
};

pub const SYSTEM_PROMPT: &str = "\
You are a calm, professional yoga instructor and assistant.

Your role:
- Hold a natural, conversational dialogue.
- Explain yoga concepts clearly and accessibly.
- Use provided yoga knowledge when relevant.
- Answer general yoga questions even if no poses are referenced.
- Prioritize safety and clarity.

Rules:
- Mention contraindications when poses or injuries are discussed.
- If the knowledge section is empty or irrelevant, answer from general yoga understanding.
- Do not provide medical diagnoses.
- Keep responses concise and helpful (3-6 sentences).";

/// Returned to the user whenever an answer cannot be produced
pub const FALLBACK_MESSAGE: &str = "I ran into an issue while answering. Please try again.";

const NO_CONTEXT: &str = "No specific pose data retrieved.";

/// Assembles the instructor prompt from retrieved pose context and the user's question.
pub fn build_prompt(context: &str, question: &str) -> String {
    let knowledge = if context.is_empty() { NO_CONTEXT } else { context };
    format!(
        "{}\n\nYoga Knowledge (may be empty):\n{}\n\nUser: {}\nInstructor:",
        SYSTEM_PROMPT, knowledge, question
    )
}

/// Answers free-text yoga questions with retrieved pose knowledge.
///
/// Failures never reach the user: [`ChatAssistant::respond`] substitutes
/// [`FALLBACK_MESSAGE`].
pub struct ChatAssistant<P, E> {
    provider: P,
    retriever: ContextRetriever<E>,
    context_k: usize,
    timeout: Duration,
    max_attempts: usize,
    initial_delay: Duration,
    max_delay: Duration,
}

impl<P: LlmProvider, E: TextEmbedder> ChatAssistant<P, E> {
    pub fn new(
        provider: P,
        retriever: ContextRetriever<E>,
        context_k: usize,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            provider,
            retriever,
            context_k,
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_delays(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    /// The model's answer, or [`FALLBACK_MESSAGE`] if anything fails.
    pub async fn respond(&self, message: &str) -> String {
        match self.try_respond(message).await {
            Ok(answer) => answer,
            Err(error) => {
                error.log_error();
                warn!(code = %error.error_code(), "Chat answer replaced with fallback");
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    pub async fn try_respond(&self, message: &str) -> Result<String, CoreError> {
        let question = message.trim();
        let context = self.retriever.retrieve_context(question, self.context_k)?;
        let prompt = build_prompt(&context, question);

        let answer = match self.generate_once(&prompt).await {
            Ok(answer) => answer,
            Err(error) => self.recover(error, &prompt).await?,
        };

        info!(
            provider = self.provider.name(),
            context_chars = context.len(),
            answer_chars = answer.len(),
            "Chat answer generated"
        );
        Ok(answer)
    }

    /// Retries a failed first attempt when the error calls for it.
    ///
    /// The retry budget and delays come from this assistant's configuration,
    /// not from the strategy's defaults.
    async fn recover(&self, error: CoreError, prompt: &str) -> Result<String, CoreError> {
        let strategy = ErrorRecovery::determine_strategy(&error);
        debug!(code = %error.error_code(), strategy = ?strategy, "Generation attempt failed");

        match strategy {
            RecoveryStrategy::RetryWithBackoff { .. } if self.max_attempts > 1 => {
                let delay = error
                    .retry_after()
                    .unwrap_or(self.initial_delay)
                    .min(self.max_delay);
                tokio::time::sleep(delay).await;

                let retry = RecoveryStrategy::RetryWithBackoff {
                    max_attempts: self.max_attempts - 1,
                    initial_delay: self.initial_delay,
                    max_delay: self.max_delay,
                };
                ErrorRecovery::apply_strategy(retry, || self.generate_once(prompt))
                    .await
                    .into_result()
            }
            _ => Err(error),
        }
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, CoreError> {
        let answer = tokio::time::timeout(self.timeout, self.provider.generate(prompt))
            .await
            .map_err(|_| CoreError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        if answer.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.provider.name().to_string(),
            }
            .into());
        }
        Ok(answer)
    }
}
