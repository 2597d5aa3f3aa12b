//! User domain service.
//!
//! Implements the user driving ports over a [`UserRepository`] and a
//! [`PasswordHasher`]. Passwords are hashed on the blocking pool so Argon2
//! never stalls an actix worker.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository, UsersCommand,
    UsersQuery,
};
use crate::domain::{
    Error, NewUser, PageRequest, PasswordHash, PlainPassword, User, UserChanges, UserId,
};

/// User service implementing [`UsersQuery`] and [`UsersCommand`].
#[derive(Clone)]
pub struct UserService<R, H> {
    repo: Arc<R>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<R, H> UserService<R, H> {
    /// Create a service over the given repository, hasher and clock.
    pub fn new(repo: Arc<R>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            hasher,
            clock,
        }
    }
}

impl<R, H> UserService<R, H>
where
    R: UserRepository,
    H: PasswordHasher + 'static,
{
    fn map_repository_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::Conflict { message } => {
                Error::conflict("email or username already registered").with_details(json!({
                    "code": "duplicate_user",
                    "reason": message,
                }))
            }
        }
    }

    fn map_hash_error(error: PasswordHashError) -> Error {
        Error::internal(error.to_string())
    }

    fn not_found(id: &UserId) -> Error {
        Error::not_found(format!("user {id} not found"))
    }

    async fn hash(&self, password: PlainPassword) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(Self::map_hash_error)
    }

    async fn fetch(&self, id: &UserId) -> Result<User, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl<R, H> UsersQuery for UserService<R, H>
where
    R: UserRepository,
    H: PasswordHasher + 'static,
{
    async fn list_users(&self, page: PageRequest) -> Result<Vec<User>, Error> {
        self.repo
            .list(page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.fetch(id).await
    }
}

#[async_trait]
impl<R, H> UsersCommand for UserService<R, H>
where
    R: UserRepository,
    H: PasswordHasher + 'static,
{
    async fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        let NewUser {
            email,
            username,
            password,
            full_name,
            is_active,
            is_superuser,
            is_verified,
            avatar_url,
            bio,
            extra_data,
        } = new_user;
        let hashed_password = self.hash(password).await?;
        let now = self.clock.utc();
        let user = User {
            id: UserId::random(),
            email,
            username,
            full_name,
            hashed_password,
            is_active,
            is_superuser,
            is_verified,
            avatar_url,
            bio,
            extra_data,
            created_at: now,
            updated_at: now,
        };
        let stored = self
            .repo
            .insert(&user)
            .await
            .map_err(Self::map_repository_error)?;
        info!(user_id = %stored.id, "user created");
        Ok(stored)
    }

    async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<User, Error> {
        let mut user = self.fetch(id).await?;
        if let Some(password) = changes.apply_to(&mut user) {
            user.hashed_password = self.hash(password).await?;
        }
        user.updated_at = self.clock.utc();
        let stored = self
            .repo
            .update(&user)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::not_found(id))?;
        info!(user_id = %stored.id, "user updated");
        Ok(stored)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), Error> {
        let removed = self
            .repo
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?;
        if !removed {
            return Err(Self::not_found(id));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
