//! Schema migrations as a graph of revisions.
//!
//! Revisions are SQL scripts naming their parent revisions. The graph may
//! branch (two revisions sharing a parent) and merge (one revision with
//! several parents). The database records its position as the set of
//! stamped heads in [`VERSION_TABLE`].
//!
//! Public surface:
//! - [`RevisionGraph`] and [`Target`]: validation and target resolution.
//! - [`plan`]: upgrade, downgrade, stamp and history planning.
//! - [`script`]: the on-disk script format.
//! - [`MigrationRunner`]: the use cases behind the `migrate` CLI.

mod error;
mod graph;
pub mod plan;
mod revision;
mod runner;
pub mod script;

pub use error::MigrationError;
pub use graph::{RevisionGraph, Target};
pub use plan::{Direction, HistoryEntry, MigrationStep};
pub use revision::{REVISION_ID_MAX, Revision, RevisionId};
pub use runner::{
    AutoBranch, AutoOutcome, CreatedRevision, CurrentRevision, MigrationRunner, SENTINEL_TABLE,
    load_graph,
};

/// Table holding the stamped head revisions.
pub const VERSION_TABLE: &str = "schema_revisions";
