//! Text embedding for pose metadata and user profiles.
//!
//! The corpus builder and the query path must share one [`TextEmbedder`];
//! cosine scores between vectors from different embedders are meaningless.

pub mod candle;
pub mod hashing;
pub mod similarity;

pub use crate::candle::EmbeddingEngine;
pub use hashing::HashingEmbedder;
pub use similarity::{cosine_similarity, dot, is_normalized, l2_norm, normalize};

use std::sync::Arc;
use tracing::info;
use yogamatch_core::{EmbedderKind, EmbeddingError, ModelConfig};

/// Builds the embedder named by `config.kind`.
pub fn load_embedder(config: &ModelConfig) -> Result<Arc<dyn TextEmbedder>, EmbeddingError> {
    let embedder: Arc<dyn TextEmbedder> = match config.kind {
        EmbedderKind::Candle => Arc::new(EmbeddingEngine::load(
            &config.dir,
            config.max_sequence_length,
        )?),
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.hashing_dimension)),
    };
    info!(
        embedder = embedder.name(),
        dimension = embedder.dimension(),
        "Text embedder ready"
    );
    Ok(embedder)
}

/// Maps text to a fixed-length, L2-normalized vector.
///
/// Implementations must be thread-safe; one instance is shared by every request.
pub trait TextEmbedder: Send + Sync {
    /// Short identifier recorded in logs
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Raw model output for non-blank text. Callers use [`TextEmbedder::embed`].
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds `text`. Blank input yields the zero vector instead of failing.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension()]);
        }

        let mut vector = self.encode(text)?;
        if vector.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                actual: vector.len(),
            });
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

impl<T: TextEmbedder + ?Sized> TextEmbedder for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).encode(text)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubling;

    impl TextEmbedder for Doubling {
        fn name(&self) -> &str {
            "doubling"
        }

        fn dimension(&self) -> usize {
            2
        }

        fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![text.len() as f32, 2.0 * text.len() as f32])
        }
    }

    struct WrongSize;

    impl TextEmbedder for WrongSize {
        fn name(&self) -> &str {
            "wrong-size"
        }

        fn dimension(&self) -> usize {
            3
        }

        fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0])
        }
    }

    #[test]
    fn blank_text_embeds_to_zero_vector() {
        assert_eq!(Doubling.embed("").unwrap(), vec![0.0, 0.0]);
        assert_eq!(Doubling.embed("   ").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn embed_normalizes_model_output() {
        let v = Doubling.embed("abc").unwrap();
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn load_embedder_follows_config_kind() {
        let hashing = ModelConfig {
            kind: EmbedderKind::Hashing,
            hashing_dimension: 32,
            ..Default::default()
        };
        let embedder = load_embedder(&hashing).unwrap();
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimension(), 32);

        let candle = ModelConfig {
            kind: EmbedderKind::Candle,
            dir: std::env::temp_dir().join("yogamatch-no-such-model"),
            ..Default::default()
        };
        assert!(matches!(
            load_embedder(&candle),
            Err(EmbeddingError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn embed_rejects_wrong_dimension() {
        assert!(matches!(
            WrongSize.embed("abc"),
            Err(EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }
}
