//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every rejection becomes `invalid_request` with `details.field` naming the
//! camelCase request field and `details.code` a stable failure code.

use serde_json::json;

use crate::domain::{
    Error, ItemId, ItemValidationError, PageRequest, PageRequestError, UserId,
    UserValidationError,
};

/// HTTP field name as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(message: impl Into<String>, field: &str, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": "invalid_uuid",
    }))
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_item_id(value: &str, field: FieldName) -> Result<ItemId, Error> {
    ItemId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    field_error(err.to_string(), err.field(), err.code())
}

pub(crate) fn item_validation_error(err: ItemValidationError) -> Error {
    field_error(err.to_string(), err.field(), err.code())
}

/// Validate `skip`/`limit` query parameters.
pub(crate) fn page_request(skip: Option<u64>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::new(skip, limit).map_err(|err| match err {
        PageRequestError::LimitOutOfRange { .. } => {
            field_error(err.to_string(), "limit", "out_of_range")
        }
    })
}
