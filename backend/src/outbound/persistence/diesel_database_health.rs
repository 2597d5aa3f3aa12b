//! Database probe backing the `/health` endpoint.

use async_trait::async_trait;
use diesel_async::SimpleAsyncConnection;

use crate::domain::ports::{DatabaseHealth, DatabaseHealthError};

use super::diesel_error_mapping::map_pool_error_message;
use super::pool::DbPool;

/// Runs `SELECT 1` on a pooled connection.
#[derive(Clone)]
pub struct DieselDatabaseHealth {
    pool: DbPool,
}

impl DieselDatabaseHealth {
    /// Create a probe over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseHealth for DieselDatabaseHealth {
    async fn ping(&self) -> Result<(), DatabaseHealthError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| DatabaseHealthError::unreachable(map_pool_error_message(err)))?;
        conn.batch_execute("SELECT 1")
            .await
            .map_err(|err| DatabaseHealthError::unreachable(err.to_string()))
    }

    fn pool_size(&self) -> u32 {
        self.pool.max_size()
    }
}
