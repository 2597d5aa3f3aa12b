//! Driving port for item writes.

use async_trait::async_trait;

use crate::domain::{Error, Item, ItemChanges, ItemId, NewItem};

/// Write-side item use cases.
#[async_trait]
pub trait ItemsCommand: Send + Sync {
    /// Create an item; `invalid_request` when the owner does not exist.
    async fn create_item(&self, new_item: NewItem) -> Result<Item, Error>;

    /// Apply a partial update.
    async fn update_item(&self, id: &ItemId, changes: ItemChanges) -> Result<Item, Error>;

    /// Remove an item.
    async fn delete_item(&self, id: &ItemId) -> Result<(), Error>;
}
