//! PostgreSQL-backed `ItemRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{ItemFilter, ItemPersistenceError, ItemRepository};
use crate::domain::{Item, ItemId, PageRequest};

use super::diesel_error_mapping::{
    DieselFailure, classify_diesel_error, map_pool_error_message,
};
use super::diesel_user_repository::page_bounds;
use super::models::{ItemRecord, ItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::items;

/// Diesel-backed implementation of the `ItemRepository` port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ItemPersistenceError {
    ItemPersistenceError::connection(map_pool_error_message(error))
}

/// Map Diesel errors; `owner_id` names the owner a failed write referenced.
fn map_diesel_error(error: diesel::result::Error, owner_id: Option<&str>) -> ItemPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => ItemPersistenceError::connection(message),
        DieselFailure::ForeignKeyViolation { constraint } => match owner_id {
            Some(owner) => ItemPersistenceError::missing_owner(owner),
            None => {
                warn!(?constraint, "unexpected foreign key violation on items");
                ItemPersistenceError::query("foreign key violation")
            }
        },
        DieselFailure::UniqueViolation { constraint } => {
            warn!(?constraint, "unexpected unique violation on items");
            ItemPersistenceError::query("unique constraint violation")
        }
        DieselFailure::Query(message) => ItemPersistenceError::query(message),
    }
}

fn map_read_error(error: diesel::result::Error) -> ItemPersistenceError {
    map_diesel_error(error, None)
}

fn to_domain(row: ItemRow) -> Result<Item, ItemPersistenceError> {
    Item::try_from(row).map_err(ItemPersistenceError::query)
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn list(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<Vec<Item>, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);

        let mut query = items::table.into_boxed();
        if let Some(owner) = &filter.owner_id {
            query = query.filter(items::owner_id.eq(*owner.as_uuid()));
        }
        if let Some(category) = &filter.category {
            query = query.filter(items::category.eq(category.clone()));
        }
        if let Some(active) = filter.is_active {
            query = query.filter(items::is_active.eq(active));
        }

        let rows: Vec<ItemRow> = query
            .order((items::created_at.asc(), items::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(ItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;

        rows.into_iter().map(to_domain).collect()
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ItemRow> = items::table
            .find(id.as_uuid())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_read_error)?;

        row.map(to_domain).transpose()
    }

    async fn insert(&self, item: &Item) -> Result<Item, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = item.owner_id.to_string();

        let row: ItemRow = diesel::insert_into(items::table)
            .values(ItemRecord::from(item))
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(&owner)))?;

        to_domain(row)
    }

    async fn update(&self, item: &Item) -> Result<Option<Item>, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = item.owner_id.to_string();

        let row: Option<ItemRow> = diesel::update(items::table.find(item.id.as_uuid()))
            .set(ItemRecord::from(item))
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, Some(&owner)))?;

        row.map(to_domain).transpose()
    }

    async fn delete(&self, id: &ItemId) -> Result<bool, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(items::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_read_error)?;

        Ok(deleted > 0)
    }
}
