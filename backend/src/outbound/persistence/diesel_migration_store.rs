//! PostgreSQL-backed `MigrationStore` implementation.
//!
//! Revision bodies are raw SQL and run through `batch_execute`; each body and
//! its version-table rewrite share one transaction, so PostgreSQL's
//! transactional DDL rolls a failed step back completely.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Bool, Text};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl, SimpleAsyncConnection};
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::migrations::{RevisionId, VERSION_TABLE};
use crate::domain::ports::{MigrationStore, MigrationStoreError};

use super::diesel_error_mapping::{
    DieselFailure, classify_diesel_error, map_pool_error_message,
};
use super::models::VersionRow;
use super::pool::{DbPool, PoolError};
use super::schema::schema_revisions;

const CREATE_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_revisions (\
    version_num VARCHAR(32) NOT NULL, \
    CONSTRAINT schema_revisions_pkc PRIMARY KEY (version_num))";

const TABLE_EXISTS: &str = "SELECT EXISTS (\
    SELECT 1 FROM information_schema.tables \
    WHERE table_schema = current_schema() AND table_name = $1) AS present";

#[derive(QueryableByName)]
struct Exists {
    #[diesel(sql_type = Bool)]
    present: bool,
}

/// Failures inside the apply transaction.
enum ApplyFailure {
    /// The revision body failed.
    Body(diesel::result::Error),
    /// Bookkeeping around the body failed.
    Store(diesel::result::Error),
}

impl From<diesel::result::Error> for ApplyFailure {
    fn from(value: diesel::result::Error) -> Self {
        Self::Store(value)
    }
}

/// Diesel-backed implementation of the `MigrationStore` port.
#[derive(Clone)]
pub struct DieselMigrationStore {
    pool: DbPool,
}

impl DieselMigrationStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MigrationStoreError {
    MigrationStoreError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> MigrationStoreError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => MigrationStoreError::connection(message),
        DieselFailure::UniqueViolation { .. } => {
            MigrationStoreError::query("duplicate version row")
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            MigrationStoreError::query("foreign key violation")
        }
        DieselFailure::Query(message) => MigrationStoreError::query(message),
    }
}

fn map_apply_failure(error: ApplyFailure) -> MigrationStoreError {
    match error {
        // Keep the database's own text: it is the only clue to a broken script.
        ApplyFailure::Body(err) => MigrationStoreError::execution(err.to_string()),
        ApplyFailure::Store(err) => map_diesel_error(err),
    }
}

async fn table_exists(
    conn: &mut AsyncPgConnection,
    table: &str,
) -> Result<bool, diesel::result::Error> {
    let row: Exists = sql_query(TABLE_EXISTS)
        .bind::<Text, _>(table)
        .get_result(conn)
        .await?;
    Ok(row.present)
}

async fn replace_rows(
    conn: &mut AsyncPgConnection,
    heads: &[RevisionId],
) -> Result<(), diesel::result::Error> {
    conn.batch_execute(CREATE_VERSION_TABLE).await?;
    diesel::delete(schema_revisions::table).execute(conn).await?;
    let rows: Vec<VersionRow<'_>> = heads
        .iter()
        .map(|head| VersionRow {
            version_num: head.as_str(),
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(schema_revisions::table)
            .values(&rows)
            .execute(conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl MigrationStore for DieselMigrationStore {
    async fn current_heads(&self) -> Result<Vec<RevisionId>, MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        if !table_exists(&mut conn, VERSION_TABLE)
            .await
            .map_err(map_diesel_error)?
        {
            return Ok(Vec::new());
        }

        let rows: Vec<String> = schema_revisions::table
            .select(schema_revisions::version_num)
            .order(schema_revisions::version_num.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|raw| {
                RevisionId::new(raw).map_err(|err| {
                    MigrationStoreError::query(format!("invalid version row: {err}"))
                })
            })
            .collect()
    }

    async fn table_exists(&self, table: &str) -> Result<bool, MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        table_exists(&mut conn, table)
            .await
            .map_err(map_diesel_error)
    }

    async fn apply(
        &self,
        sql: &str,
        heads_after: &[RevisionId],
    ) -> Result<(), MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, ApplyFailure, _>(|conn| {
            async move {
                if !sql.trim().is_empty() {
                    conn.batch_execute(sql).await.map_err(ApplyFailure::Body)?;
                }
                replace_rows(conn, heads_after).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_apply_failure)
    }

    async fn stamp(&self, heads: &[RevisionId]) -> Result<(), MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move { replace_rows(conn, heads).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
