//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's driven ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: pool and Diesel failures are classified once
//!   (`diesel_error_mapping.rs`) and mapped to each port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use crud_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/app")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_database_health;
mod diesel_error_mapping;
mod diesel_item_repository;
mod diesel_migration_store;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_database_health::DieselDatabaseHealth;
pub use diesel_item_repository::DieselItemRepository;
pub use diesel_migration_store::DieselMigrationStore;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
