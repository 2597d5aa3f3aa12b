//! Adapters feeding the migration runner: revision scripts on disk and a
//! database-less store for offline SQL rendering.

mod file_revision_source;
mod offline_store;

pub use file_revision_source::FileRevisionSource;
pub use offline_store::OfflineMigrationStore;

use crate::domain::migrations::MigrationRunner;
use crate::outbound::persistence::DieselMigrationStore;

/// Runner over PostgreSQL and a scripts directory.
pub type PgMigrationRunner = MigrationRunner<DieselMigrationStore, FileRevisionSource>;

/// Runner that renders SQL without connecting.
pub type OfflineMigrationRunner = MigrationRunner<OfflineMigrationStore, FileRevisionSource>;
