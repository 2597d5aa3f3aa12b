//! Items owned by users.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Maximum title length.
pub const TITLE_MAX: usize = 200;
/// Maximum category length.
pub const CATEGORY_MAX: usize = 50;
/// Maximum length of a single tag.
pub const TAG_MAX: usize = 50;
/// Currency applied when none is supplied.
pub const DEFAULT_CURRENCY: &str = "USD";
/// Fractional digits stored for prices (`NUMERIC(10,2)`).
pub const PRICE_SCALE: u32 = 2;

/// Upper bound (exclusive) for prices: eight integer digits.
fn price_limit() -> Decimal {
    Decimal::new(100_000_000, 0)
}

/// Validation failures for item fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemValidationError {
    #[error("item id must be a valid UUID")]
    InvalidId,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("price must not be negative")]
    NegativePrice,
    #[error("price must have at most {scale} decimal places")]
    PriceScale { scale: u32 },
    #[error("price must be less than 100000000")]
    PriceTooLarge,
    #[error("currency must be a three-letter ISO 4217 code")]
    InvalidCurrency,
    #[error("category must be at most {max} characters")]
    CategoryTooLong { max: usize },
    #[error("tags must not be empty strings")]
    EmptyTag,
    #[error("tags must be at most {max} characters")]
    TagTooLong { max: usize },
    #[error("extra data must be a JSON object")]
    ExtraDataNotObject,
}

impl ItemValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::NegativePrice | Self::PriceScale { .. } | Self::PriceTooLarge => "price",
            Self::InvalidCurrency => "currency",
            Self::CategoryTooLong { .. } => "category",
            Self::EmptyTag | Self::TagTooLong { .. } => "tags",
            Self::ExtraDataNotObject => "extraData",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_uuid",
            Self::EmptyTitle | Self::EmptyTag => "empty",
            Self::TitleTooLong { .. } | Self::CategoryTooLong { .. } | Self::TagTooLong { .. } => {
                "too_long"
            }
            Self::NegativePrice | Self::PriceScale { .. } | Self::PriceTooLarge => "invalid_price",
            Self::InvalidCurrency => "invalid_currency",
            Self::ExtraDataNotObject => "invalid_type",
        }
    }
}

/// Stable item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Parse an item id from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ItemValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| ItemValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item title, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    /// Validate and trim a title.
    pub fn new(title: impl Into<String>) -> Result<Self, ItemValidationError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ItemValidationError::EmptyTitle);
        }
        if title.chars().count() > TITLE_MAX {
            return Err(ItemValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(title))
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Title> for String {
    fn from(value: Title) -> Self {
        value.0
    }
}

impl TryFrom<String> for Title {
    type Error = ItemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-negative amount with at most two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Validate a price against `NUMERIC(10,2)` bounds.
    pub fn new(amount: Decimal) -> Result<Self, ItemValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ItemValidationError::NegativePrice);
        }
        if amount.normalize().scale() > PRICE_SCALE {
            return Err(ItemValidationError::PriceScale { scale: PRICE_SCALE });
        }
        if amount >= price_limit() {
            return Err(ItemValidationError::PriceTooLarge);
        }
        let mut amount = amount;
        amount.rescale(PRICE_SCALE);
        Ok(Self(amount))
    }

    /// The amount, always at scale two.
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ItemValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate a currency code; lower-case input is upper-cased.
    pub fn new(code: impl Into<String>) -> Result<Self, ItemValidationError> {
        let code = code.into().trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ItemValidationError::InvalidCurrency);
        }
        Ok(Self(code))
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_owned())
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl TryFrom<String> for Currency {
    type Error = ItemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validate an optional category.
pub fn validate_category(value: Option<String>) -> Result<Option<String>, ItemValidationError> {
    match value {
        Some(category) if category.chars().count() > CATEGORY_MAX => {
            Err(ItemValidationError::CategoryTooLong { max: CATEGORY_MAX })
        }
        other => Ok(other),
    }
}

/// Validate tags, dropping duplicates while keeping first occurrences.
pub fn normalise_tags(tags: Vec<String>) -> Result<Vec<String>, ItemValidationError> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        validate_tag(&tag)?;
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    Ok(unique)
}

fn validate_tag(tag: &str) -> Result<(), ItemValidationError> {
    if tag.trim().is_empty() {
        return Err(ItemValidationError::EmptyTag);
    }
    if tag.chars().count() > TAG_MAX {
        return Err(ItemValidationError::TagTooLong { max: TAG_MAX });
    }
    Ok(())
}

/// Validate free-form extra data, defaulting to an empty object.
pub fn validate_extra_data(value: Option<Value>) -> Result<Value, ItemValidationError> {
    super::user::validate_extra_data(value).map_err(|_| ItemValidationError::ExtraDataNotObject)
}

/// Catalogue item.
///
/// ## Invariants
/// - `tags` contains no duplicates or empty strings.
/// - `owner_id` references an existing user; deleting the user deletes the item.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[schema(value_type = String, format = Uuid)]
    pub id: ItemId,
    #[schema(value_type = String, example = "Desk lamp")]
    pub title: Title,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "12.50")]
    pub price: Option<Price>,
    #[schema(value_type = String, example = "USD")]
    pub currency: Currency,
    pub is_active: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    #[schema(value_type = Object)]
    pub extra_data: Value,
    #[schema(value_type = String, format = Uuid)]
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Human readable price such as `USD 12.50`, or `N/A` when unset.
    pub fn price_formatted(&self) -> String {
        match self.price {
            Some(price) => format!("{} {:.2}", self.currency, price.amount()),
            None => "N/A".to_owned(),
        }
    }

    /// Add a tag unless it is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<bool, ItemValidationError> {
        let tag = tag.into();
        validate_tag(&tag)?;
        if self.tags.contains(&tag) {
            return Ok(false);
        }
        self.tags.push(tag);
        Ok(true)
    }

    /// Remove a tag, reporting whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        before != self.tags.len()
    }
}

/// Validated input for creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: Title,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub currency: Currency,
    pub is_active: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub extra_data: Value,
    pub owner_id: UserId,
}

/// Validated partial update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub title: Option<Title>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub currency: Option<Currency>,
    pub is_active: Option<bool>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub extra_data: Option<Value>,
    pub owner_id: Option<UserId>,
}

impl ItemChanges {
    /// Overwrite the fields present in this change set.
    pub fn apply_to(self, item: &mut Item) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if self.description.is_some() {
            item.description = self.description;
        }
        if self.price.is_some() {
            item.price = self.price;
        }
        if let Some(currency) = self.currency {
            item.currency = currency;
        }
        if let Some(flag) = self.is_active {
            item.is_active = flag;
        }
        if self.category.is_some() {
            item.category = self.category;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(extra) = self.extra_data {
            item.extra_data = extra;
        }
        if let Some(owner) = self.owner_id {
            item.owner_id = owner;
        }
    }
}
