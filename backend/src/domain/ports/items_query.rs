//! Driving port for item reads.

use async_trait::async_trait;

use crate::domain::{Error, Item, ItemId, PageRequest};

use super::ItemFilter;

/// Read-side item use cases.
#[async_trait]
pub trait ItemsQuery: Send + Sync {
    /// Filtered page of items.
    async fn list_items(&self, filter: ItemFilter, page: PageRequest) -> Result<Vec<Item>, Error>;

    /// A single item, or `not_found`.
    async fn get_item(&self, id: &ItemId) -> Result<Item, Error>;
}
