use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum CorpusError {
    #[error("Corpus file not found: {path}")]
    FileNotFound { path: String },

    #[error("Corpus file unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Malformed corpus: {details}")]
    Malformed { details: String },

    #[error("Corpus contains no poses")]
    Empty,

    #[error("Duplicate pose name: {name}")]
    DuplicatePose { name: String },

    #[error("Pose '{pose}' is missing field {field}")]
    MissingField { pose: String, field: String },

    #[error("Pose '{pose}' {field} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        pose: String,
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Pose '{pose}' {field} is not unit-normalized (norm {norm})")]
    NotNormalized {
        pose: String,
        field: String,
        norm: f32,
    },
}

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model loading failed: {model_path}")]
    ModelLoadingFailed { model_path: String },

    #[error("Model not found: {model_name}")]
    ModelNotFound { model_name: String },

    #[error("Tokenization failed: {text_length} characters")]
    TokenizationFailed { text_length: usize },

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Provider authentication failed: {provider}")]
    AuthenticationFailed { provider: String },

    #[error("API key invalid or missing for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Rate limit exceeded for {provider}. Retry after {retry_after} seconds")]
    RateLimitExceeded { provider: String, retry_after: u64 },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Content filtered by provider: {reason}")]
    ContentFiltered { reason: String },

    #[error("Provider service unavailable: {provider}")]
    ServiceUnavailable { provider: String },

    #[error("Request timeout for {provider}")]
    RequestTimeout { provider: String },

    #[error("Invalid response format from {provider}")]
    InvalidResponseFormat { provider: String },

    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {details}")]
    InvalidFormat { details: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
