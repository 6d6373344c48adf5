//! Runs: lifecycle, options, naming, and creation collaborators
//!
//! ```text
//! RunOptions ──> name resolution ──> RunCatalog::register ──> Workspace::ensure_dir
//!                (generate_random_name                          │
//!                 + make_unique)                                 v
//!                                                Run [running -> success | failed]
//! ```

mod catalog;
mod naming;
mod options;
mod run_record;

pub use catalog::{DirectoryWorkspace, MemoryCatalog, MemoryWorkspace, RunCatalog, RunSlot, Workspace};
pub use naming::{
    check_run_name, generate_random_name, generate_random_name_with, make_unique,
    POSITIVE_ADJECTIVES, TREE_NAMES,
};
pub use options::RunOptions;
pub(crate) use run_record::RunParts;
pub use run_record::{Run, RunSnapshot, RunStatus};
