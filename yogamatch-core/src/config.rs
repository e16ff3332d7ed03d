use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_CORPUS_PATH: &str = "YOGAMATCH_CORPUS";
pub const ENV_MODEL_DIR: &str = "YOGAMATCH_MODEL_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/yoga_corpus.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// BERT sentence encoder loaded from `dir`
    #[default]
    Candle,
    /// Feature hashing; needs no model files
    Hashing,
}

/// Text embedder selection. For `candle`, `dir` holds a sentence-transformers
/// export (config.json, tokenizer.json, model.safetensors).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: EmbedderKind,
    pub dir: PathBuf,
    pub max_sequence_length: usize,
    /// Vector length of the hashing embedder
    pub hashing_dimension: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::default(),
            dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            max_sequence_length: 256,
            hashing_dimension: 384,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Cosine similarity over sentence embeddings
    #[default]
    Semantic,
    /// Jaccard word overlap over the raw pose texts
    Lexical,
}

impl StrategyKind {
    pub fn default_discard_threshold(self) -> f32 {
        match self {
            StrategyKind::Semantic => 0.25,
            StrategyKind::Lexical => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub goals_benefits: f32,
    pub physical_benefits: f32,
    pub mental_benefits: f32,
    pub physical_match: f32,
    pub mental_match: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            goals_benefits: 4.0,
            physical_benefits: 4.0,
            mental_benefits: 4.0,
            physical_match: 2.0,
            mental_match: 2.0,
        }
    }
}

impl ScoringWeights {
    pub fn as_array(&self) -> [f32; 5] {
        [
            self.goals_benefits,
            self.physical_benefits,
            self.mental_benefits,
            self.physical_match,
            self.mental_match,
        ]
    }

    pub fn total(&self) -> f32 {
        self.as_array().iter().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub strategy: StrategyKind,
    pub top_k: usize,
    /// Overrides the strategy's own discard threshold when set
    pub contraindication_threshold: Option<f32>,
    pub weights: ScoringWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            top_k: 10,
            contraindication_threshold: None,
            weights: ScoringWeights::default(),
        }
    }
}

impl ScoringConfig {
    pub fn discard_threshold(&self) -> f32 {
        self.contraindication_threshold
            .unwrap_or_else(|| self.strategy.default_discard_threshold())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_similarity: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub timeout_secs: u64,
    pub max_attempts: usize,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Reads the TOML file (when given), applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `GOOGLE_API_KEY`, `YOGAMATCH_CORPUS` and `YOGAMATCH_MODEL_DIR` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_GOOGLE_API_KEY).filter(|key| !key.is_empty()) {
            self.generation.api_key = Some(key);
        }
        if let Some(path) = lookup(ENV_CORPUS_PATH) {
            self.corpus.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            self.model.dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.scoring.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "scoring.weights".to_string(),
                value: format!("{:?}", weights),
            });
        }
        if self.scoring.weights.total() <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.weights".to_string(),
                value: "sum must be positive".to_string(),
            });
        }
        if self.scoring.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.top_k".to_string(),
                value: "0".to_string(),
            });
        }
        if !self.scoring.discard_threshold().is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "scoring.contraindication_threshold".to_string(),
                value: self.scoring.discard_threshold().to_string(),
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.top_k".to_string(),
                value: "0".to_string(),
            });
        }
        if !self.retrieval.min_similarity.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.min_similarity".to_string(),
                value: self.retrieval.min_similarity.to_string(),
            });
        }
        if self.model.kind == EmbedderKind::Hashing && self.model.hashing_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                field: "model.hashing_dimension".to_string(),
                value: "0".to_string(),
            });
        }
        if self.generation.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "generation.max_attempts".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
