//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer. Rows are converted to
//! domain aggregates with `TryFrom`, re-validating stored values so a row
//! written outside the API cannot smuggle invalid data into responses.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    Currency, Email, Item, ItemId, PasswordHash, Price, Title, User, UserId, Username,
};

use super::schema::{items, schema_revisions, users};

/// Row read from `users`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub extra_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid =
            |err: crate::domain::UserValidationError| format!("stored user {id} is invalid: {err}");
        Ok(Self {
            id: UserId::from_uuid(row.id),
            email: Email::new(row.email.as_str()).map_err(invalid)?,
            username: Username::new(row.username.as_str()).map_err(invalid)?,
            full_name: row.full_name,
            hashed_password: PasswordHash::new(row.hashed_password),
            is_active: row.is_active,
            is_superuser: row.is_superuser,
            is_verified: row.is_verified,
            avatar_url: row.avatar_url,
            bio: row.bio,
            extra_data: row.extra_data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Full user row for inserts and updates.
///
/// `treat_none_as_null` makes updates write cleared optional fields instead
/// of skipping them.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRecord<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub username: &'a str,
    pub full_name: Option<&'a str>,
    pub hashed_password: &'a str,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub avatar_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub extra_data: &'a Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for UserRecord<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email.as_ref(),
            username: user.username.as_ref(),
            full_name: user.full_name.as_deref(),
            hashed_password: user.hashed_password.as_str(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
            avatar_url: user.avatar_url.as_deref(),
            bio: user.bio.as_deref(),
            extra_data: &user.extra_data,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Row read from `items`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub is_active: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub extra_data: Value,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = String;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid =
            |err: crate::domain::ItemValidationError| format!("stored item {id} is invalid: {err}");
        Ok(Self {
            id: ItemId::from_uuid(row.id),
            title: Title::new(row.title.as_str()).map_err(invalid)?,
            description: row.description,
            price: row.price.map(Price::new).transpose().map_err(invalid)?,
            currency: Currency::new(row.currency.as_str()).map_err(invalid)?,
            is_active: row.is_active,
            category: row.category,
            tags: row.tags,
            extra_data: row.extra_data,
            owner_id: UserId::from_uuid(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Full item row for inserts and updates.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = items)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ItemRecord<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub price: Option<Decimal>,
    pub currency: &'a str,
    pub is_active: bool,
    pub category: Option<&'a str>,
    pub tags: &'a [String],
    pub extra_data: &'a Value,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Item> for ItemRecord<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: *item.id.as_uuid(),
            title: item.title.as_ref(),
            description: item.description.as_deref(),
            price: item.price.map(|price| price.amount()),
            currency: item.currency.as_ref(),
            is_active: item.is_active,
            category: item.category.as_deref(),
            tags: &item.tags,
            extra_data: &item.extra_data,
            owner_id: *item.owner_id.as_uuid(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Row of the version table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema_revisions)]
pub(crate) struct VersionRow<'a> {
    pub version_num: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{fixed_time, item, user};
    use rstest::rstest;
    use serde_json::json;

    fn user_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            full_name: None,
            hashed_password: "$argon2id$stub".into(),
            is_active: true,
            is_superuser: false,
            is_verified: true,
            avatar_url: None,
            bio: Some("mathematician".into()),
            extra_data: json!({"theme": "dark"}),
            created_at: fixed_time(),
            updated_at: fixed_time(),
        }
    }

    #[rstest]
    fn user_row_converts_to_domain() {
        let row = user_row();
        let id = row.id;
        let user = User::try_from(row).expect("valid row");
        assert_eq!(*user.id.as_uuid(), id);
        assert_eq!(user.bio.as_deref(), Some("mathematician"));
        assert!(user.is_authenticated());
    }

    #[rstest]
    fn corrupt_user_row_names_the_row() {
        let mut row = user_row();
        row.email = "not-an-email".into();
        let id = row.id;
        let err = User::try_from(row).expect_err("invalid email");
        assert!(err.contains(&id.to_string()), "{err}");
    }

    #[rstest]
    fn user_record_borrows_domain_fields() {
        let user = user("ada");
        let record = UserRecord::from(&user);
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.hashed_password, user.hashed_password.as_str());
    }

    #[rstest]
    fn item_record_keeps_price_scale() {
        let item = item(UserId::random(), "Desk lamp");
        let record = ItemRecord::from(&item);
        assert_eq!(record.price.map(|p| p.to_string()), Some("12.50".into()));
        assert_eq!(record.currency, "USD");
    }

    #[rstest]
    fn item_row_rejects_bad_currency() {
        let row = ItemRow {
            id: Uuid::new_v4(),
            title: "Desk lamp".into(),
            description: None,
            price: None,
            currency: "dollars".into(),
            is_active: true,
            category: None,
            tags: vec!["home".into()],
            extra_data: json!({}),
            owner_id: Uuid::new_v4(),
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        assert!(Item::try_from(row).is_err());
    }
}
