//! Tag recording state
//!
//! ```text
//! TagRegistry ──< TagState
//!                   ├── StepIndexSet   [steps already accepted]
//!                   └── TagAggregate   [count, min, max]
//! ```

mod aggregate;
mod registry;
mod step_index;

pub use aggregate::TagAggregate;
pub use registry::{TagRegistry, TagState};
pub use step_index::StepIndexSet;
