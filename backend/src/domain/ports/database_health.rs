//! Driven port used by the health endpoint to probe the database.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Database probe failures.
    pub enum DatabaseHealthError {
        /// The probe could not reach the database.
        Unreachable { message: String } => "database unreachable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    /// Run a trivial round trip against the database.
    async fn ping(&self) -> Result<(), DatabaseHealthError>;

    /// Configured maximum pool size, reported by `/info`.
    fn pool_size(&self) -> u32;
}
