//! Store used by `migrate --sql`, where no database is reachable.

use async_trait::async_trait;

use crate::domain::migrations::RevisionId;
use crate::domain::ports::{MigrationStore, MigrationStoreError};

const OFFLINE: &str = "offline mode has no database connection";

/// Refuses every call; offline rendering only reads the revision graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineMigrationStore;

#[async_trait]
impl MigrationStore for OfflineMigrationStore {
    async fn current_heads(&self) -> Result<Vec<RevisionId>, MigrationStoreError> {
        Err(MigrationStoreError::connection(OFFLINE))
    }

    async fn table_exists(&self, _table: &str) -> Result<bool, MigrationStoreError> {
        Err(MigrationStoreError::connection(OFFLINE))
    }

    async fn apply(
        &self,
        _sql: &str,
        _heads_after: &[RevisionId],
    ) -> Result<(), MigrationStoreError> {
        Err(MigrationStoreError::connection(OFFLINE))
    }

    async fn stamp(&self, _heads: &[RevisionId]) -> Result<(), MigrationStoreError> {
        Err(MigrationStoreError::connection(OFFLINE))
    }
}
