use crate::TextEmbedder;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};
use yogamatch_core::EmbeddingError;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Deserialize)]
struct ModelDimensions {
    hidden_size: usize,
}

/// Sentence embedder running a BERT encoder (e.g. all-MiniLM-L6-v2) on the CPU
/// with mean pooling over tokens.
pub struct EmbeddingEngine {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
    model_name: String,
}

impl EmbeddingEngine {
    /// Loads `config.json`, `tokenizer.json` and `model.safetensors` from `model_dir`.
    pub fn load(model_dir: &Path, max_sequence_length: usize) -> Result<Self, EmbeddingError> {
        let model_name = model_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_dir.display().to_string());

        let config_path = require_file(model_dir, CONFIG_FILE, &model_name)?;
        let tokenizer_path = require_file(model_dir, TOKENIZER_FILE, &model_name)?;
        let weights_path = require_file(model_dir, WEIGHTS_FILE, &model_name)?;

        let load_failed = |path: &Path| EmbeddingError::ModelLoadingFailed {
            model_path: path.display().to_string(),
        };

        let config_json =
            std::fs::read_to_string(&config_path).map_err(|_| load_failed(&config_path))?;
        let config: Config =
            serde_json::from_str(&config_json).map_err(|_| load_failed(&config_path))?;
        let dimensions: ModelDimensions =
            serde_json::from_str(&config_json).map_err(|_| load_failed(&config_path))?;

        let device = Device::Cpu;
        // SAFETY: the weights file is memory-mapped read-only and is not modified while loaded.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DTYPE, &device) }
            .map_err(|_| load_failed(&weights_path))?;
        let model = BertModel::load(vb, &config).map_err(|_| load_failed(&weights_path))?;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|_| load_failed(&tokenizer_path))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|_| load_failed(&tokenizer_path))?;

        info!(
            model = %model_name,
            dimension = dimensions.hidden_size,
            "Loaded sentence embedding model"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension: dimensions.hidden_size,
            model_name,
        })
    }

    fn forward(&self, ids: &[u32]) -> Result<Vec<f32>, candle_core::Error> {
        let token_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;
        let hidden = self.model.forward(&token_ids, &token_type_ids)?;

        let (_batch, n_tokens, _hidden) = hidden.dims3()?;
        let pooled = (hidden.sum(1)? / (n_tokens as f64))?;
        pooled.squeeze(0)?.to_vec1::<f32>()
    }
}

impl TextEmbedder for EmbeddingEngine {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self.tokenizer.encode(text, true).map_err(|_| {
            EmbeddingError::TokenizationFailed {
                text_length: text.len(),
            }
        })?;
        debug!(n_tokens = encoding.get_ids().len(), "Tokenized text");

        self.forward(encoding.get_ids())
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: e.to_string(),
            })
    }
}

fn require_file(dir: &Path, file: &str, model_name: &str) -> Result<PathBuf, EmbeddingError> {
    let path = dir.join(file);
    if path.is_file() {
        Ok(path)
    } else {
        Err(EmbeddingError::ModelNotFound {
            model_name: format!("{} (missing {})", model_name, file),
        })
    }
}
