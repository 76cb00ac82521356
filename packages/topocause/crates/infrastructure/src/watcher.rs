use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use domain::Topology;

use crate::loader::load_topology;

/// Hot-reloadable topology backed by a file.
///
/// Readers take an `Arc` snapshot that stays valid for a whole cycle; a
/// reload builds a fresh `Topology` and swaps the pointer.
pub struct TopologyHandle {
    path: PathBuf,
    current: RwLock<Versioned>,
    modified: Mutex<Option<SystemTime>>,
}

/// A topology together with the generation it was installed as.
struct Versioned {
    topology: Arc<Topology>,
    generation: u64,
}

impl TopologyHandle {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let modified = mtime(&path)?;
        let topology = load_topology(&path)?;
        tracing::info!(path = %path.display(), devices = topology.len(), "topology loaded");

        Ok(Self {
            path,
            current: RwLock::new(Versioned {
                topology: Arc::new(topology),
                generation: 1,
            }),
            modified: Mutex::new(modified),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<Topology> {
        self.current.read().topology.clone()
    }

    /// Incremented on every successful swap, starting at 1.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// The current topology and its generation, read under one lock.
    pub fn versioned_snapshot(&self) -> (Arc<Topology>, u64) {
        let current = self.current.read();
        (current.topology.clone(), current.generation)
    }

    /// Reload when the file's modification time moved.
    ///
    /// Returns whether a new topology was installed. A file that fails to
    /// load leaves the previous snapshot in place.
    pub fn reload_if_changed(&self) -> Result<bool> {
        let mut modified = self.modified.lock();
        let now = mtime(&self.path)?;
        if now == *modified {
            return Ok(false);
        }

        match load_topology(&self.path) {
            Ok(topology) => {
                *modified = now;
                self.install(topology);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "topology reload failed, keeping previous snapshot"
                );
                Err(err)
            }
        }
    }

    /// Swap in a topology built elsewhere.
    pub fn replace(&self, topology: Topology) {
        self.install(topology);
    }

    fn install(&self, topology: Topology) {
        let devices = topology.len();
        let generation = {
            let mut current = self.current.write();
            current.generation += 1;
            current.topology = Arc::new(topology);
            current.generation
        };
        tracing::info!(path = %self.path.display(), devices, generation, "topology swapped");
    }
}

fn mtime(path: &Path) -> Result<Option<SystemTime>> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    Ok(metadata.modified().ok())
}
