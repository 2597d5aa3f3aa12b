//! Driven port for item persistence.

use async_trait::async_trait;

use crate::domain::{Item, ItemId, PageRequest, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by item repository adapters.
    pub enum ItemPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "item repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "item repository query failed: {message}",
        /// The referenced owner does not exist.
        MissingOwner { owner_id: String } => "item owner {owner_id} does not exist",
    }
}

/// Optional equality filters for item listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub owner_id: Option<UserId>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Filtered page of items ordered by creation time, then id.
    async fn list(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<Vec<Item>, ItemPersistenceError>;

    /// Fetch an item by identifier.
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemPersistenceError>;

    /// Insert a new item, returning the stored row.
    async fn insert(&self, item: &Item) -> Result<Item, ItemPersistenceError>;

    /// Overwrite an item's mutable fields; `None` when the row is gone.
    async fn update(&self, item: &Item) -> Result<Option<Item>, ItemPersistenceError>;

    /// Delete an item.
    async fn delete(&self, id: &ItemId) -> Result<bool, ItemPersistenceError>;
}
