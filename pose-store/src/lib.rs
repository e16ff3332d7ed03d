//! Immutable in-memory table of poses and their precomputed embeddings.
//!
//! A [`PoseStore`] is built once at startup and shared read-only (usually
//! behind an `Arc`) by every request; it exposes no mutation.

pub mod builder;
pub mod cache;


pub use builder::CorpusBuilder;
pub use cache::CorpusCache;

use embedding_engine::{is_normalized, l2_norm};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};
use yogamatch_core::{CoreError, CorpusError, PoseRecord};

#[derive(Debug, Clone)]
pub struct PoseStore {
    poses: Vec<PoseRecord>,
    dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreHealth {
    pub poses_loaded: usize,
    pub dimension: usize,
}

impl PoseStore {
    /// Reads and validates a JSON corpus file.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        if !path.exists() {
            return Err(CorpusError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| CorpusError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let store = Self::from_json_str(&contents)?;
        info!(
            path = %path.display(),
            poses = store.len(),
            dimension = store.dimension,
            "Loaded pose corpus"
        );
        Ok(store)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, CorpusError> {
        let poses: Vec<PoseRecord> =
            serde_json::from_str(contents).map_err(|e| CorpusError::Malformed {
                details: e.to_string(),
            })?;
        Self::from_records(poses)
    }

    /// Validates names and embeddings; insertion order is kept as iteration order.
    pub fn from_records(poses: Vec<PoseRecord>) -> Result<Self, CorpusError> {
        let first = poses.first().ok_or(CorpusError::Empty)?;
        let dimension = first.benefits_embedding.len();

        {
            let mut names = HashSet::with_capacity(poses.len());
            for (index, pose) in poses.iter().enumerate() {
                if pose.name.trim().is_empty() {
                    return Err(CorpusError::MissingField {
                        pose: format!("#{}", index),
                        field: "AName".to_string(),
                    });
                }
                if !names.insert(pose.name.as_str()) {
                    return Err(CorpusError::DuplicatePose {
                        name: pose.name.clone(),
                    });
                }
                validate_embeddings(pose, dimension)?;
            }
        }

        debug!(poses = poses.len(), dimension, "Validated pose corpus");
        Ok(Self { poses, dimension })
    }

    pub fn all(&self) -> &[PoseRecord] {
        &self.poses
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoseRecord> {
        self.poses.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PoseRecord> {
        self.poses.iter().find(|pose| pose.name == name)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn health(&self) -> StoreHealth {
        StoreHealth {
            poses_loaded: self.len(),
            dimension: self.dimension,
        }
    }

    /// Writes the corpus in the same JSON format [`PoseStore::load`] reads.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string(&self.poses)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), poses = self.len(), "Saved pose corpus");
        Ok(())
    }
}

fn validate_embeddings(pose: &PoseRecord, dimension: usize) -> Result<(), CorpusError> {
    for (field, vector) in pose.embeddings() {
        if vector.is_empty() {
            return Err(CorpusError::MissingField {
                pose: pose.name.clone(),
                field: field.to_string(),
            });
        }
        if vector.len() != dimension {
            return Err(CorpusError::DimensionMismatch {
                pose: pose.name.clone(),
                field: field.to_string(),
                expected: dimension,
                actual: vector.len(),
            });
        }
        if !is_normalized(vector) {
            return Err(CorpusError::NotNormalized {
                pose: pose.name.clone(),
                field: field.to_string(),
                norm: l2_norm(vector),
            });
        }
    }
    Ok(())
}
