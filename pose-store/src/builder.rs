use crate::PoseStore;
use embedding_engine::TextEmbedder;
use std::path::Path;
use tracing::info;
use yogamatch_core::{CoreError, CorpusError, PoseRecord};

/// Offline step that turns text-only pose records into a corpus with embeddings.
///
/// Must run with the same embedder the query path uses.
pub struct CorpusBuilder<'a> {
    embedder: &'a dyn TextEmbedder,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(embedder: &'a dyn TextEmbedder) -> Self {
        Self { embedder }
    }

    /// Reads raw poses: the corpus JSON format with the `_emb` columns absent.
    pub fn read_raw(path: &Path) -> Result<Vec<PoseRecord>, CorpusError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CorpusError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                CorpusError::Unreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        serde_json::from_str(&contents).map_err(|e| CorpusError::Malformed {
            details: e.to_string(),
        })
    }

    /// Embeds the four text fields of every pose, overwriting any existing vectors.
    pub fn build(&self, poses: Vec<PoseRecord>) -> Result<PoseStore, CoreError> {
        let mut built = Vec::with_capacity(poses.len());
        for mut pose in poses {
            pose.benefits_embedding = self.embedder.embed(&pose.benefits)?;
            pose.contraindications_embedding = self.embedder.embed(&pose.contraindications)?;
            pose.physical_problems_embedding =
                self.embedder.embed(&pose.targeted_physical_problems)?;
            pose.mental_problems_embedding =
                self.embedder.embed(&pose.targeted_mental_problems)?;
            built.push(pose);
        }

        info!(
            embedder = self.embedder.name(),
            poses = built.len(),
            "Embedded pose corpus"
        );
        Ok(PoseStore::from_records(built)?)
    }
}
