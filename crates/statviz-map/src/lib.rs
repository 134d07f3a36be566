//! Variable-role assignment for StatViz datasets.

pub mod error;
pub mod state;
pub mod suggest;

pub use error::{MappingError, Result};
pub use state::{Assignment, MappingSummary, RoleAssignment};
pub use suggest::{MIN_SUGGESTION_SCORE, suggest_column};
