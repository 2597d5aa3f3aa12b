//! Shared helpers for the PostgreSQL integration suites.
//!
//! Suites run only when `TEST_DATABASE_URL` points at a reachable server;
//! otherwise each test prints a skip marker and returns. Every test gets its
//! own schema, selected through the connection's `search_path`, so suites can
//! share one database without interfering.

use std::path::PathBuf;
use std::sync::Arc;

use crud_backend::outbound::migrations::{FileRevisionSource, PgMigrationRunner};
use crud_backend::outbound::persistence::{DbPool, DieselMigrationStore, PoolConfig};
use crud_backend::test_support::fixtures::fixture_clock;
use diesel_async::SimpleAsyncConnection;
use url::Url;
use uuid::Uuid;

const DATABASE_URL_ENV: &str = "TEST_DATABASE_URL";

/// Revision scripts shipped with the crate.
pub fn shipped_migrations() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

/// A throwaway schema and a pool bound to it.
pub struct TestDatabase {
    pub pool: DbPool,
    pub schema: String,
    admin: DbPool,
}

impl TestDatabase {
    /// Runner over this schema and the scripts in `dir`.
    pub fn runner(&self, dir: impl Into<PathBuf>) -> PgMigrationRunner {
        PgMigrationRunner::new(
            Arc::new(DieselMigrationStore::new(self.pool.clone())),
            Arc::new(FileRevisionSource::new(dir)),
            fixture_clock(),
        )
    }

    /// Run raw SQL against this schema.
    pub async fn execute(&self, sql: &str) {
        let mut conn = self.pool.get().await.expect("checkout connection");
        conn.batch_execute(sql).await.expect("execute sql");
    }

    /// Drop the schema and everything in it.
    pub async fn teardown(self) {
        let mut conn = self.admin.get().await.expect("checkout admin connection");
        conn.batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .await
            .expect("drop test schema");
    }
}

/// Provision a schema, or `None` when no test database is configured.
pub async fn test_database() -> Option<TestDatabase> {
    let Ok(raw_url) = std::env::var(DATABASE_URL_ENV) else {
        eprintln!("SKIP-TEST-DATABASE: {DATABASE_URL_ENV} is not set");
        return None;
    };

    let admin = DbPool::new(PoolConfig::new(raw_url.as_str()).with_max_size(1))
        .await
        .unwrap_or_else(|err| panic!("connect to {DATABASE_URL_ENV}: {err}"));
    let schema = format!("test_{}", Uuid::new_v4().simple());
    {
        let mut conn = admin.get().await.expect("checkout admin connection");
        conn.batch_execute(&format!("CREATE SCHEMA {schema}"))
            .await
            .expect("create test schema");
    }

    let mut url = Url::parse(&raw_url).expect("TEST_DATABASE_URL is a URL");
    url.query_pairs_mut()
        .append_pair("options", &format!("-csearch_path={schema}"));
    let pool = DbPool::new(PoolConfig::new(url.as_str()).with_max_size(2))
        .await
        .expect("connect with test schema");

    Some(TestDatabase {
        pool,
        schema,
        admin,
    })
}

/// Provision a schema and bring it to head with the shipped scripts.
pub async fn migrated_database() -> Option<TestDatabase> {
    let db = test_database().await?;
    db.runner(shipped_migrations())
        .auto()
        .await
        .expect("shipped migrations apply");
    Some(db)
}
