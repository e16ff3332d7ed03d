use std::time::Duration;
use yogamatch_core::{
    ConfigError, CoreError, CorpusError, EmbeddingError, ErrorExt, ErrorReporter, LlmError,
};

#[test]
fn test_error_codes() {
    let corpus_error = CoreError::Corpus(CorpusError::Empty);
    assert_eq!(corpus_error.error_code(), "CORPUS");

    let llm_error = CoreError::Llm(LlmError::InvalidApiKey {
        provider: "gemini".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM");

    let embedding_error = CoreError::Embedding(EmbeddingError::ModelNotFound {
        model_name: "all-MiniLM-L6-v2".to_string(),
    });
    assert_eq!(embedding_error.error_code(), "EMBEDDING");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "corpus.path".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let mismatch = CorpusError::DimensionMismatch {
        pose: "Tadasana".to_string(),
        field: "Benefits_emb".to_string(),
        expected: 384,
        actual: 383,
    };
    assert_eq!(mismatch.error_code(), "CORPUS_DIMENSION_MISMATCH");
}

#[test]
fn test_retryable_errors() {
    let retryable_error = CoreError::Llm(LlmError::RateLimitExceeded {
        provider: "gemini".to_string(),
        retry_after: 60,
    });
    assert!(retryable_error.is_retryable());

    let corpus_error = CoreError::Corpus(CorpusError::FileNotFound {
        path: "poses.json".to_string(),
    });
    assert!(!corpus_error.is_retryable());

    let non_retryable_error = CoreError::Config(ConfigError::MissingField {
        field: "corpus.path".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error = CoreError::Llm(LlmError::RateLimitExceeded {
        provider: "gemini".to_string(),
        retry_after: 60,
    });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let timeout_error = CoreError::Timeout { seconds: 30 };
    assert_eq!(timeout_error.retry_after(), Some(Duration::from_secs(30)));

    assert_eq!(CoreError::Corpus(CorpusError::Empty).retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let corpus_error = CoreError::Corpus(CorpusError::FileNotFound {
        path: "data/yoga_corpus.json".to_string(),
    });
    let message = corpus_error.user_friendly_message();
    assert!(message.contains("data/yoga_corpus.json"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "corpus.path".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(!message.is_empty());
    assert!(message.contains("corpus.path"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::Embedding(EmbeddingError::InferenceFailed {
        reason: "test".to_string(),
    });

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
