use crate::TextEmbedder;
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};
use yogamatch_core::EmbeddingError;

// Changing either key changes every vector; rebuild the corpus afterwards.
const HASH_SEED_K0: u64 = 0x796f_6761_6d61_7463;
const HASH_SEED_K1: u64 = 0x6865_6d62_6564_6431;

pub const DEFAULT_DIMENSION: usize = 384;

/// Model-free embedder: signed feature hashing of lower-cased word unigrams.
///
/// Deterministic across runs and platforms, so a corpus built with it stays
/// valid for as long as the seeds and tokenization are unchanged. Only words
/// shared between two texts contribute to their similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash(token: &str, salt: u8) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        salt.hash(&mut hasher);
        token.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let word = word.to_lowercase();
            let index = (Self::hash(&word, 0) % self.dimension as u64) as usize;
            let sign = if Self::hash(&word, 1) % 2 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        Ok(vector)
    }
}
