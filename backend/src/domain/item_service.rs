//! Item domain service implementing the item driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    ItemFilter, ItemPersistenceError, ItemRepository, ItemsCommand, ItemsQuery,
};
use crate::domain::{Error, Item, ItemChanges, ItemId, NewItem, PageRequest};

/// Item service implementing [`ItemsQuery`] and [`ItemsCommand`].
#[derive(Clone)]
pub struct ItemService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ItemService<R> {
    /// Create a service over the given repository and clock.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R> ItemService<R>
where
    R: ItemRepository,
{
    fn map_repository_error(error: ItemPersistenceError) -> Error {
        match error {
            ItemPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("item repository unavailable: {message}"))
            }
            ItemPersistenceError::Query { message } => {
                Error::internal(format!("item repository error: {message}"))
            }
            ItemPersistenceError::MissingOwner { owner_id } => {
                Error::invalid_request(format!("owner {owner_id} does not exist")).with_details(
                    json!({
                        "field": "ownerId",
                        "code": "unknown_owner",
                    }),
                )
            }
        }
    }

    fn not_found(id: &ItemId) -> Error {
        Error::not_found(format!("item {id} not found"))
    }
}

#[async_trait]
impl<R> ItemsQuery for ItemService<R>
where
    R: ItemRepository,
{
    async fn list_items(&self, filter: ItemFilter, page: PageRequest) -> Result<Vec<Item>, Error> {
        self.repo
            .list(&filter, page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn get_item(&self, id: &ItemId) -> Result<Item, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl<R> ItemsCommand for ItemService<R>
where
    R: ItemRepository,
{
    async fn create_item(&self, new_item: NewItem) -> Result<Item, Error> {
        let now = self.clock.utc();
        let item = Item {
            id: ItemId::random(),
            title: new_item.title,
            description: new_item.description,
            price: new_item.price,
            currency: new_item.currency,
            is_active: new_item.is_active,
            category: new_item.category,
            tags: new_item.tags,
            extra_data: new_item.extra_data,
            owner_id: new_item.owner_id,
            created_at: now,
            updated_at: now,
        };
        let stored = self
            .repo
            .insert(&item)
            .await
            .map_err(Self::map_repository_error)?;
        info!(item_id = %stored.id, owner_id = %stored.owner_id, "item created");
        Ok(stored)
    }

    async fn update_item(&self, id: &ItemId, changes: ItemChanges) -> Result<Item, Error> {
        let mut item = self.get_item(id).await?;
        changes.apply_to(&mut item);
        item.updated_at = self.clock.utc();
        let stored = self
            .repo
            .update(&item)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::not_found(id))?;
        info!(item_id = %stored.id, "item updated");
        Ok(stored)
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), Error> {
        if !self
            .repo
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?
        {
            return Err(Self::not_found(id));
        }
        info!(item_id = %id, "item deleted");
        Ok(())
    }
}
