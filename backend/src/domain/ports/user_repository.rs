//! Driven port for user persistence.

use async_trait::async_trait;

use crate::domain::{PageRequest, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique constraint (email or username) rejected the write.
        Conflict { message: String } => "user repository conflict: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Page of users ordered by creation time, then id.
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Insert a new user, returning the stored row.
    async fn insert(&self, user: &User) -> Result<User, UserPersistenceError>;

    /// Overwrite a user's mutable fields; `None` when the row is gone.
    async fn update(&self, user: &User) -> Result<Option<User>, UserPersistenceError>;

    /// Delete a user and, through the foreign key, their items.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}
