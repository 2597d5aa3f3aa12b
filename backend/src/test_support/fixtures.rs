//! Builders for users and items with fixed timestamps.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::{
    Currency, Email, Item, ItemId, NewItem, NewUser, PasswordHash, PlainPassword, Price, Title,
    User, UserId, Username,
};

/// Timestamp shared by fixture rows: 2024-05-01T12:00:00Z.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("fixture timestamp is unambiguous"))
}

/// Clock frozen at an instant.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl FixtureClock {
    /// Clock reporting `utc_now` forever.
    pub fn at(utc_now: DateTime<Utc>) -> Self {
        Self { utc_now }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Shared clock frozen at [`fixed_time`].
pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock::at(fixed_time()))
}

fn email(raw: &str) -> Email {
    Email::new(raw).unwrap_or_else(|err| panic!("fixture email {raw}: {err}"))
}

fn username(raw: &str) -> Username {
    Username::new(raw).unwrap_or_else(|err| panic!("fixture username {raw}: {err}"))
}

fn password(raw: &str) -> PlainPassword {
    PlainPassword::new(raw).unwrap_or_else(|err| panic!("fixture password: {err}"))
}

/// Stored user `<name>@example.com` with a placeholder hash.
pub fn user(name: &str) -> User {
    User {
        id: UserId::random(),
        email: email(&format!("{name}@example.com")),
        username: username(name),
        full_name: None,
        hashed_password: PasswordHash::new(format!("hashed:{name}-password")),
        is_active: true,
        is_superuser: false,
        is_verified: false,
        avatar_url: None,
        bio: None,
        extra_data: json!({}),
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

/// Creation input matching [`user`].
pub fn new_user(name: &str) -> NewUser {
    NewUser {
        email: email(&format!("{name}@example.com")),
        username: username(name),
        password: password(&format!("{name}-password")),
        full_name: None,
        is_active: true,
        is_superuser: false,
        is_verified: false,
        avatar_url: None,
        bio: None,
        extra_data: json!({}),
    }
}

fn title(raw: &str) -> Title {
    Title::new(raw).unwrap_or_else(|err| panic!("fixture title {raw}: {err}"))
}

/// Stored item priced at 12.50 USD.
pub fn item(owner_id: UserId, raw_title: &str) -> Item {
    Item {
        id: ItemId::random(),
        title: title(raw_title),
        description: None,
        price: Some(price(1250)),
        currency: Currency::default(),
        is_active: true,
        category: None,
        tags: Vec::new(),
        extra_data: json!({}),
        owner_id,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

/// Creation input matching [`item`].
pub fn new_item(owner_id: UserId, raw_title: &str) -> NewItem {
    NewItem {
        title: title(raw_title),
        description: None,
        price: Some(price(1250)),
        currency: Currency::default(),
        is_active: true,
        category: None,
        tags: Vec::new(),
        extra_data: json!({}),
        owner_id,
    }
}

/// Price from an amount in cents.
pub fn price(cents: i64) -> Price {
    Price::new(Decimal::new(cents, 2)).unwrap_or_else(|err| panic!("fixture price: {err}"))
}
