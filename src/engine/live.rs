//! Atomically published snapshots
//!
//! Readers hold an `Arc<Snapshot>` and never observe a partially built
//! view. A reload builds a complete new snapshot first and swaps it in with
//! a single pointer store.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Engine, Snapshot};
use crate::error::Error;

/// Shared, swappable snapshot
#[derive(Debug)]
pub struct LiveSnapshot {
    current: ArcSwap<Snapshot>,
}

impl LiveSnapshot {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Run the engine once and publish its result
    pub fn initialize(engine: &Engine) -> Result<Self, Error> {
        Ok(Self::new(engine.run()?))
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot, returning the previous one
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.current.swap(Arc::new(snapshot))
    }

    /// Re-run the engine and publish on success
    ///
    /// On failure the previous snapshot stays visible.
    pub fn reload(&self, engine: &Engine) -> Result<Arc<Snapshot>, Error> {
        match engine.run() {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.current.store(Arc::clone(&snapshot));
                info!(
                    properties = snapshot.properties.len(),
                    selected = snapshot.selection.selected.len(),
                    "Published reloaded snapshot"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "Reload failed, keeping previous snapshot");
                Err(e)
            }
        }
    }
}
