//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories, health probe and migration
//!   store built on Diesel
//! - **migrations**: revision scripts read from and written to disk
//! - **password**: Argon2id password hashing
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod migrations;
pub mod password;
pub mod persistence;
