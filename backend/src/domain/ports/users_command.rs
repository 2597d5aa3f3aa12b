//! Driving port for user writes.

use async_trait::async_trait;

use crate::domain::{Error, NewUser, User, UserChanges, UserId};

/// Write-side user use cases.
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Register a user; `conflict` when email or username is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, Error>;

    /// Apply a partial update, rehashing the password when supplied.
    async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<User, Error>;

    /// Remove a user and their items.
    async fn delete_user(&self, id: &UserId) -> Result<(), Error>;
}
