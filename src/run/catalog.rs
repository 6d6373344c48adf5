//! Run catalog and workspace - collaborators injected at run creation
//!
//! The recorder never touches global state: the set of existing run names,
//! name registration, and directory creation all go through these traits.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::{Error, Result};

/// Slot assigned to a newly registered run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSlot {
    /// Run ID.
    pub id: u64,
    /// Position of the run in the catalog (1-based).
    pub index: u64,
    /// Directory the run's logs go to.
    pub logs_dir: PathBuf,
}

/// Registry of runs known to the tracking tool.
pub trait RunCatalog: Send + Sync {
    /// Names of all registered runs.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registration` if the catalog cannot be read.
    fn existing_names(&self) -> Result<Vec<String>>;

    /// Register a run name and assign it a slot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registration` if the name is taken or the catalog
    /// cannot be written.
    fn register(&self, name: &str) -> Result<RunSlot>;
}

/// Directory provisioning for run folders.
pub trait Workspace: Send + Sync {
    /// Make sure `path` exists as a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn ensure_dir(&self, path: &Path) -> Result<()>;
}

/// In-memory run catalog.
///
/// IDs and indices are assigned sequentially from 1; a run's logs directory
/// is `<root>/<name>/logs`.
#[derive(Debug)]
pub struct MemoryCatalog {
    root: PathBuf,
    runs: DashMap<String, RunSlot>,
    next_id: AtomicU64,
}

impl MemoryCatalog {
    /// Create an empty catalog rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            runs: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a catalog pre-populated with runs.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registration` on duplicate names.
    pub fn with_names<I, S>(root: impl Into<PathBuf>, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let catalog = Self::new(root);
        for name in names {
            catalog.register(name.as_ref())?;
        }
        Ok(catalog)
    }

    /// Slot of a registered run.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<RunSlot> {
        self.runs.get(name).map(|slot| slot.value().clone())
    }

    /// Number of registered runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl RunCatalog for MemoryCatalog {
    fn existing_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.runs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn register(&self, name: &str) -> Result<RunSlot> {
        match self.runs.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::Registration(format!(
                "run '{name}' is already registered"
            ))),
            Entry::Vacant(vacant) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let slot = RunSlot {
                    id,
                    index: id,
                    logs_dir: self.root.join(name).join("logs"),
                };
                vacant.insert(slot.clone());
                Ok(slot)
            }
        }
    }
}

/// Workspace backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryWorkspace;

impl Workspace for DirectoryWorkspace {
    fn ensure_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }
}

/// Workspace that only remembers which directories were requested.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    dirs: DashSet<PathBuf>,
}

impl MemoryWorkspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` was ensured.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }
}

impl Workspace for MemoryWorkspace {
    fn ensure_dir(&self, path: &Path) -> Result<()> {
        self.dirs.insert(path.to_path_buf());
        Ok(())
    }
}
