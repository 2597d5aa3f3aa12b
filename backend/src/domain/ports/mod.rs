//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hashers, migration storage) are implemented by
//! outbound adapters. Driving ports (`*Query`, `*Command`) are what inbound
//! adapters call; domain services implement them.

mod macros;
pub(crate) use macros::define_port_error;

mod database_health;
mod item_repository;
mod items_command;
mod items_query;
mod migration_store;
mod password_hasher;
mod revision_source;
mod user_repository;
mod users_command;
mod users_query;

#[cfg(test)]
pub use database_health::MockDatabaseHealth;
pub use database_health::{DatabaseHealth, DatabaseHealthError};
#[cfg(test)]
pub use item_repository::MockItemRepository;
pub use item_repository::{ItemFilter, ItemPersistenceError, ItemRepository};
pub use items_command::ItemsCommand;
pub use items_query::ItemsQuery;
#[cfg(test)]
pub use migration_store::MockMigrationStore;
pub use migration_store::{MigrationStore, MigrationStoreError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use revision_source::MockRevisionSource;
pub use revision_source::{RevisionFile, RevisionSource, RevisionSourceError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
pub use users_command::UsersCommand;
pub use users_query::UsersQuery;
