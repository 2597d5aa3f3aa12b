//! Driven port over the database side of schema migrations.
//!
//! The store owns the version table (`schema_revisions`) whose rows are the
//! currently stamped head revisions, and executes revision bodies.

use async_trait::async_trait;

use crate::domain::migrations::RevisionId;

use super::define_port_error;

define_port_error! {
    /// Failures raised by migration store adapters.
    pub enum MigrationStoreError {
        /// The database could not be reached.
        Connection { message: String } => "migration store connection failed: {message}",
        /// Reading or writing the version table failed.
        Query { message: String } => "migration store query failed: {message}",
        /// A revision body failed; the transaction was rolled back.
        Execution { message: String } => "migration SQL failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Rows of the version table; empty when the table does not exist.
    async fn current_heads(&self) -> Result<Vec<RevisionId>, MigrationStoreError>;

    /// Whether `table` exists in the current schema.
    async fn table_exists(&self, table: &str) -> Result<bool, MigrationStoreError>;

    /// Run `sql` and replace the version rows with `heads_after` in one
    /// transaction.
    async fn apply(
        &self,
        sql: &str,
        heads_after: &[RevisionId],
    ) -> Result<(), MigrationStoreError>;

    /// Replace the version rows without running any SQL.
    async fn stamp(&self, heads: &[RevisionId]) -> Result<(), MigrationStoreError>;
}
