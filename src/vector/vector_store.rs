//! Vector Store
//!
//! Append-only, exact L2 nearest-neighbor store over fixed-dimension
//! embeddings. Each slot maps to a caller-supplied external id.

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::similarity::squared_l2_distance;
use crate::error::{Error, Result};
use crate::persistence::snapshot::{self, SnapshotPresence, SnapshotView};

/// Default embedding dimension (all-MiniLM-L6-v2)
pub const DEFAULT_DIMENSION: usize = 384;

/// When a store with a backing path writes itself to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointMode {
    /// Checkpoint inside every insert (slowest, safest)
    #[default]
    Always,
    /// Only on `flush` or `save`; inserts batch up in memory
    Manual,
}

/// One nearest-neighbor result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub external_id: i64,
    pub slot_id: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

struct StoreState {
    /// Row-major `count * dimension`
    vectors: Vec<f32>,
    /// Slot id -> external id
    external_ids: Vec<i64>,
    generation: u64,
    /// Inserts not yet written to the backing path
    dirty: bool,
}

impl StoreState {
    fn empty() -> Self {
        Self {
            vectors: Vec::new(),
            external_ids: Vec::new(),
            generation: 0,
            dirty: false,
        }
    }

    fn view(&self, dimension: usize, generation: u64) -> SnapshotView<'_> {
        SnapshotView {
            generation,
            dimension,
            vectors: &self.vectors,
            external_ids: &self.external_ids,
        }
    }
}

/// Thread-safe persistent vector store
///
/// Readers (`search`, `reconstruct`, `count`) run concurrently; `insert`
/// holds the write lock across append and checkpoint, so slot ids are
/// gapless and the files on disk never show a partial insert.
pub struct VectorStore {
    state: RwLock<StoreState>,
    dimension: usize,
    path: Option<PathBuf>,
    checkpoint: CheckpointMode,
}

impl VectorStore {
    /// Create an empty in-memory store with no backing path
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be > 0".into()));
        }
        Ok(Self {
            state: RwLock::new(StoreState::empty()),
            dimension,
            path: None,
            checkpoint: CheckpointMode::Always,
        })
    }

    /// Restore the store at `path`, or start an empty one bound to it.
    ///
    /// Fails with `CorruptStore` if only one of the two files exists or they
    /// disagree, and with `DimensionMismatch` if the stored dimension differs.
    pub fn open<P: AsRef<Path>>(path: P, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        match snapshot::presence(path) {
            SnapshotPresence::Missing => {
                let mut store = Self::new(dimension)?;
                store.path = Some(path.to_path_buf());
                info!(
                    "Created empty vector store at {:?} (dimension {})",
                    path, dimension
                );
                Ok(store)
            }
            SnapshotPresence::Partial => Err(Error::corrupt(
                path,
                format!(
                    "only one of {:?} and {:?} exists",
                    path,
                    snapshot::metadata_path(path)
                ),
            )),
            SnapshotPresence::Complete => {
                let store = Self::load(path)?;
                if store.dimension != dimension {
                    return Err(Error::DimensionMismatch {
                        expected: dimension,
                        actual: store.dimension,
                    });
                }
                Ok(store)
            }
        }
    }

    /// Load a saved store; its dimension comes from the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let loaded = snapshot::read(path)?;

        info!(
            "Restored vector store from {:?} ({} vectors, dimension {}, generation {})",
            path,
            loaded.count(),
            loaded.dimension,
            loaded.generation
        );

        Ok(Self {
            state: RwLock::new(StoreState {
                vectors: loaded.vectors,
                external_ids: loaded.external_ids,
                generation: loaded.generation,
                dirty: false,
            }),
            dimension: loaded.dimension,
            path: Some(path.to_path_buf()),
            checkpoint: CheckpointMode::Always,
        })
    }

    pub fn with_checkpoint(mut self, mode: CheckpointMode) -> Self {
        self.checkpoint = mode;
        self
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Backing path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn checkpoint_mode(&self) -> CheckpointMode {
        self.checkpoint
    }

    /// Generation of the last snapshot written or loaded
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// True when inserts have not reached the backing path yet
    pub fn is_dirty(&self) -> bool {
        self.state.read().dirty
    }

    /// Number of stored vectors
    pub fn count(&self) -> usize {
        self.state.read().external_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        if len != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }

    /// Append a vector and return its slot id.
    ///
    /// In `Always` mode a failed checkpoint rolls the append back.
    pub fn insert(&self, external_id: i64, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector.len())?;

        let mut state = self.state.write();
        let slot_id = state.external_ids.len();
        let was_dirty = state.dirty;

        state.vectors.extend_from_slice(vector);
        state.external_ids.push(external_id);
        state.dirty = true;

        if let (CheckpointMode::Always, Some(path)) = (self.checkpoint, self.path.as_deref()) {
            let next = state.generation + 1;
            if let Err(e) = snapshot::write(path, state.view(self.dimension, next)) {
                state.vectors.truncate(slot_id * self.dimension);
                state.external_ids.truncate(slot_id);
                state.dirty = was_dirty;
                warn!(
                    "Checkpoint of {:?} failed, rolled back slot {}: {}",
                    path, slot_id, e
                );
                return Err(e);
            }
            state.generation = next;
            state.dirty = false;
        }

        debug!("Inserted external id {} at slot {}", external_id, slot_id);
        Ok(slot_id)
    }

    /// Exact k nearest neighbors by squared Euclidean distance.
    ///
    /// Ascending by distance, ties broken by ascending slot id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.check_dimension(query.len())?;

        let state = self.state.read();
        if k == 0 || state.external_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = state
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(slot, v)| (squared_l2_distance(query, v), slot))
            .collect();

        let order = |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));

        // Partition the k best to the front before sorting them
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, order);
            scored.truncate(k);
        }
        scored.sort_unstable_by(order);

        Ok(scored
            .into_iter()
            .map(|(distance, slot_id)| SearchHit {
                external_id: state.external_ids[slot_id],
                slot_id,
                distance,
            })
            .collect())
    }

    /// Copy of the vector stored at `slot_id`, bit-identical to the insert
    pub fn reconstruct(&self, slot_id: usize) -> Result<Vec<f32>> {
        let state = self.state.read();
        let count = state.external_ids.len();
        if slot_id >= count {
            return Err(Error::NotFound { slot_id, count });
        }
        let start = slot_id * self.dimension;
        Ok(state.vectors[start..start + self.dimension].to_vec())
    }

    /// External id recorded for `slot_id`
    pub fn external_id(&self, slot_id: usize) -> Result<i64> {
        let state = self.state.read();
        state
            .external_ids
            .get(slot_id)
            .copied()
            .ok_or(Error::NotFound {
                slot_id,
                count: state.external_ids.len(),
            })
    }

    /// Write a snapshot to `path`. Saving to the backing path clears the dirty flag.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        // Upgradable read: searches keep running, inserts and other saves wait
        let state = self.state.upgradable_read();
        let next = state.generation + 1;
        snapshot::write(path, state.view(self.dimension, next))?;

        let count = state.external_ids.len();
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.generation = next;
        if self.path.as_deref() == Some(path) {
            state.dirty = false;
        }

        info!(
            "Saved vector store to {:?} ({} vectors, generation {})",
            path, count, next
        );
        Ok(())
    }

    /// Persist pending inserts to the backing path.
    ///
    /// Returns `false` when there was nothing to write or no backing path.
    pub fn flush(&self) -> Result<bool> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        if !self.state.read().dirty {
            return Ok(false);
        }
        self.save(path)?;
        Ok(true)
    }
}

impl fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStore")
            .field("dimension", &self.dimension)
            .field("count", &self.count())
            .field("path", &self.path)
            .field("checkpoint", &self.checkpoint)
            .finish()
    }
}
