use embedding_engine::{dot, TextEmbedder};
use pose_store::PoseStore;
use std::sync::Arc;
use tracing::debug;
use yogamatch_core::{CoreError, EmbeddingError, PoseRecord};

/// A pose returned by [`ContextRetriever::retrieve`] with its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct ContextHit<'a> {
    pub pose: &'a PoseRecord,
    pub similarity: f32,
}

/// Finds poses whose benefits are close to a free-text question.
///
/// Stored embeddings are unit length (checked at load), so the dot product
/// is the cosine similarity.
pub struct ContextRetriever<E> {
    store: Arc<PoseStore>,
    embedder: E,
    min_similarity: f32,
}

impl<E: TextEmbedder> ContextRetriever<E> {
    pub fn new(
        store: Arc<PoseStore>,
        embedder: E,
        min_similarity: f32,
    ) -> Result<Self, EmbeddingError> {
        if embedder.dimension() != store.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: store.dimension(),
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            store,
            embedder,
            min_similarity,
        })
    }

    /// The `k` most similar poses, keeping only those above the minimum similarity.
    ///
    /// The cut to `k` happens before the similarity filter, so fewer than `k`
    /// hits may come back even when lower-ranked poses would pass.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ContextHit<'_>>, EmbeddingError> {
        let vector = self.embedder.embed(query)?;

        let mut hits: Vec<ContextHit<'_>> = self
            .store
            .iter()
            .map(|pose| ContextHit {
                pose,
                similarity: dot(&vector, &pose.benefits_embedding),
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k);
        hits.retain(|hit| hit.similarity > self.min_similarity);

        debug!(k, hits = hits.len(), "Retrieved context");
        Ok(hits)
    }

    /// Formatted knowledge block for the chat prompt, or `""` when nothing matched.
    pub fn retrieve_context(&self, query: &str, k: usize) -> Result<String, CoreError> {
        let blocks: Vec<String> = self
            .retrieve(query, k)?
            .iter()
            .map(|hit| format_block(hit.pose))
            .collect();
        Ok(blocks.join("\n\n"))
    }
}

fn format_block(pose: &PoseRecord) -> String {
    format!(
        "Pose: {}\nBenefits: {}\nContraindications: {}",
        pose.name, pose.benefits, pose.contraindications
    )
}
