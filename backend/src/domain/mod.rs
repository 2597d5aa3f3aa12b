//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, the ports adapters implement, and the services that
//! drive those ports. Invariants and serialisation contracts (serde) are
//! documented on each type.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - User, Item and their validated field newtypes.
//! - PageRequest: validated `skip`/`limit` pair.
//! - UserService / ItemService: driving port implementations.
//! - migrations: revision graph, planner and runner.

pub mod error;
pub mod item;
pub mod item_service;
pub mod migrations;
pub mod pagination;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_service;

pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::item::{
    Currency, Item, ItemChanges, ItemId, ItemValidationError, NewItem, Price, Title,
};
pub use self::item_service::ItemService;
pub use self::pagination::{PageRequest, PageRequestError};
pub use self::trace_id::TraceId;
pub use self::user::{
    Email, NewUser, PasswordHash, PlainPassword, User, UserChanges, UserId, UserValidationError,
    Username,
};
pub use self::user_service::UserService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use crud_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such user"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
