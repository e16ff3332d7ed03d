use crate::PoseStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;
use yogamatch_core::CorpusError;

/// Hands out one shared [`PoseStore`] per corpus file.
///
/// Owned by the process entry point and passed down by reference; loading the
/// same path twice returns the already-loaded store.
#[derive(Default)]
pub struct CorpusCache {
    stores: Mutex<HashMap<PathBuf, Arc<PoseStore>>>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, path: &Path) -> Result<Arc<PoseStore>, CorpusError> {
        let key = path
            .canonicalize()
            .map_err(|e| {
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

        // Held across the load so concurrent callers never parse the same file twice.
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(store) = stores.get(&key) {
            debug!(path = %key.display(), "Pose corpus served from cache");
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(PoseStore::load(&key)?);
        stores.insert(key, Arc::clone(&store));
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.stores.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
