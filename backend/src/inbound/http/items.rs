//! Items API handlers.
//!
//! ```text
//! GET    /api/items?skip=0&limit=100&owner_id=...&category=books&is_active=true
//! POST   /api/items {"title":"Desk lamp","ownerId":"..."}
//! GET    /api/items/{item_id}
//! PUT    /api/items/{item_id} {"price":"19.99"}
//! DELETE /api/items/{item_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::item::{normalise_tags, validate_category, validate_extra_data};
use crate::domain::ports::ItemFilter;
use crate::domain::{
    Currency, Error, Item, ItemChanges, ItemValidationError, NewItem, Price, Title,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, item_validation_error, page_request, parse_item_id, parse_user_id,
};

const ITEM_ID: FieldName = FieldName::new("itemId");
const OWNER_ID: FieldName = FieldName::new("ownerId");

/// Pagination and equality filters for `GET /api/items`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemListQuery {
    /// Rows to skip (default 0).
    pub skip: Option<u64>,
    /// Page size (default 100, max 1000).
    pub limit: Option<u32>,
    /// Only items owned by this user.
    pub owner_id: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl ItemListQuery {
    fn filter(&self) -> Result<ItemFilter, Error> {
        Ok(ItemFilter {
            owner_id: self
                .owner_id
                .as_deref()
                .map(|raw| parse_user_id(raw, FieldName::new("owner_id")))
                .transpose()?,
            category: self.category.clone(),
            is_active: self.is_active,
        })
    }
}

/// Request body for `POST /api/items`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[schema(example = "Desk lamp")]
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "12.50")]
    pub price: Option<Decimal>,
    /// ISO 4217 code; defaults to `USD`.
    #[schema(example = "USD")]
    pub currency: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub extra_data: Option<Value>,
    #[schema(format = Uuid)]
    pub owner_id: String,
}

fn default_true() -> bool {
    true
}

fn validated<T>(result: Result<T, ItemValidationError>) -> Result<T, Error> {
    result.map_err(item_validation_error)
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = Error;

    fn try_from(value: CreateItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: validated(Title::new(value.title))?,
            description: value.description,
            price: validated(value.price.map(Price::new).transpose())?,
            currency: match value.currency {
                Some(code) => validated(Currency::new(code))?,
                None => Currency::default(),
            },
            is_active: value.is_active,
            category: validated(validate_category(value.category))?,
            tags: validated(normalise_tags(value.tags))?,
            extra_data: validated(validate_extra_data(value.extra_data))?,
            owner_id: parse_user_id(&value.owner_id, OWNER_ID)?,
        })
    }
}

/// Request body for `PUT /api/items/{item_id}`; absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    pub category: Option<String>,
    /// Replaces the whole tag list.
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub extra_data: Option<Value>,
    /// Reassign the item to another user.
    pub owner_id: Option<String>,
}

impl TryFrom<UpdateItemRequest> for ItemChanges {
    type Error = Error;

    fn try_from(value: UpdateItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: validated(value.title.map(Title::new).transpose())?,
            description: value.description,
            price: validated(value.price.map(Price::new).transpose())?,
            currency: validated(value.currency.map(Currency::new).transpose())?,
            is_active: value.is_active,
            category: validated(validate_category(value.category))?,
            tags: validated(value.tags.map(normalise_tags).transpose())?,
            extra_data: validated(
                value
                    .extra_data
                    .map(|extra| validate_extra_data(Some(extra)))
                    .transpose(),
            )?,
            owner_id: value
                .owner_id
                .as_deref()
                .map(|raw| parse_user_id(raw, OWNER_ID))
                .transpose()?,
        })
    }
}

/// List items, optionally filtered by owner, category and active flag.
#[utoipa::path(
    get,
    path = "/api/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Items", body = [Item]),
        (status = 400, description = "Invalid filter or pagination", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["items"],
    operation_id = "listItems"
)]
#[get("/items")]
pub async fn list_items(
    state: web::Data<HttpState>,
    query: web::Query<ItemListQuery>,
) -> ApiResult<web::Json<Vec<Item>>> {
    let filter = query.filter()?;
    let page = page_request(query.skip, query.limit)?;
    let items = state.items.list_items(filter, page).await?;
    Ok(web::Json(items))
}

/// Create an item owned by an existing user.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid request or unknown owner", body = Error)
    ),
    tags = ["items"],
    operation_id = "createItem"
)]
#[post("/items")]
pub async fn create_item(
    state: web::Data<HttpState>,
    payload: web::Json<CreateItemRequest>,
) -> ApiResult<HttpResponse> {
    let new_item = NewItem::try_from(payload.into_inner())?;
    let item = state.items_command.create_item(new_item).await?;
    Ok(HttpResponse::Created().json(item))
}

/// Fetch an item by id.
#[utoipa::path(
    get,
    path = "/api/items/{item_id}",
    params(("item_id" = String, Path, description = "Item UUID")),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "No such item", body = Error)
    ),
    tags = ["items"],
    operation_id = "getItem"
)]
#[get("/items/{item_id}")]
pub async fn get_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Item>> {
    let id = parse_item_id(&path, ITEM_ID)?;
    Ok(web::Json(state.items.get_item(&id).await?))
}

/// Partially update an item.
#[utoipa::path(
    put,
    path = "/api/items/{item_id}",
    params(("item_id" = String, Path, description = "Item UUID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item", body = Item),
        (status = 400, description = "Invalid request or unknown owner", body = Error),
        (status = 404, description = "No such item", body = Error)
    ),
    tags = ["items"],
    operation_id = "updateItem"
)]
#[put("/items/{item_id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateItemRequest>,
) -> ApiResult<web::Json<Item>> {
    let id = parse_item_id(&path, ITEM_ID)?;
    let changes = ItemChanges::try_from(payload.into_inner())?;
    Ok(web::Json(state.items_command.update_item(&id, changes).await?))
}

/// Delete an item.
#[utoipa::path(
    delete,
    path = "/api/items/{item_id}",
    params(("item_id" = String, Path, description = "Item UUID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "No such item", body = Error)
    ),
    tags = ["items"],
    operation_id = "deleteItem"
)]
#[delete("/items/{item_id}")]
pub async fn delete_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_item_id(&path, ITEM_ID)?;
    state.items_command.delete_item(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
