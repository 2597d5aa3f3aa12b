//! Driving port for user reads.

use async_trait::async_trait;

use crate::domain::{Error, PageRequest, User, UserId};

/// Read-side user use cases.
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Page of users.
    async fn list_users(&self, page: PageRequest) -> Result<Vec<User>, Error>;

    /// A single user, or `not_found`.
    async fn get_user(&self, id: &UserId) -> Result<User, Error>;
}
