//! `PlantStore` — the plant-graph provider shared by router and scheduler.

use std::sync::Arc;

use parking_lot::RwLock;

use tc_core::PathId;

use crate::{PlantModel, PlantResult};

/// Holds the current plant snapshot and a generation counter.
///
/// Every mutation builds a new `PlantModel`, swaps the `Arc` and increments
/// the generation under the same write lock, so a reader always sees a
/// matching `(generation, snapshot)` pair.
pub struct PlantStore {
    current: RwLock<(u64, Arc<PlantModel>)>,
}

impl PlantStore {
    pub fn new(model: PlantModel) -> Self {
        Self { current: RwLock::new((0, Arc::new(model))) }
    }

    /// The current snapshot.  Cheap: one `Arc` clone under a read lock.
    pub fn snapshot(&self) -> Arc<PlantModel> {
        Arc::clone(&self.current.read().1)
    }

    /// The current generation together with its snapshot.
    pub fn versioned_snapshot(&self) -> (u64, Arc<PlantModel>) {
        let guard = self.current.read();
        (guard.0, Arc::clone(&guard.1))
    }

    pub fn generation(&self) -> u64 {
        self.current.read().0
    }

    /// Lock or unlock `path`.  A no-op (no generation bump) if the flag
    /// already has the requested value.
    pub fn set_path_locked(&self, path: PathId, locked: bool) -> PlantResult<()> {
        let mut guard = self.current.write();
        let already = guard
            .1
            .path(path)
            .is_some_and(|p| p.locked == locked);
        if already {
            return Ok(());
        }
        let next = guard.1.with_path_locked(path, locked)?;
        guard.0 += 1;
        guard.1 = Arc::new(next);
        tracing::info!(%path, locked, generation = guard.0, "path lock state changed");
        Ok(())
    }

    /// Replace the whole model (topology edit).
    pub fn replace_model(&self, model: PlantModel) {
        let mut guard = self.current.write();
        guard.0 += 1;
        guard.1 = Arc::new(model);
        tracing::info!(generation = guard.0, "plant model replaced");
    }
}

impl Default for PlantStore {
    fn default() -> Self {
        Self::new(PlantModel::empty())
    }
}
