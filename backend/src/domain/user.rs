//! User accounts.
//!
//! Validated newtypes guard the fields with format rules (email, username,
//! plain-text password). Optional profile fields are validated through the
//! `validate_*` helpers so both create and update paths share one rule set.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Maximum stored length of an email address.
pub const EMAIL_MAX: usize = 255;
/// Minimum username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length.
pub const USERNAME_MAX: usize = 50;
/// Maximum full name length.
pub const FULL_NAME_MAX: usize = 100;
/// Minimum plain-text password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum plain-text password length.
pub const PASSWORD_MAX: usize = 128;
/// Maximum avatar URL length.
pub const AVATAR_URL_MAX: usize = 500;

/// Validation failures for user fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("email must contain a local part and a domain separated by '@'")]
    InvalidEmail,
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("username may only contain letters, digits, '_', '.' or '-'")]
    UsernameInvalidCharacters,
    #[error("full name must be at most {max} characters")]
    FullNameTooLong { max: usize },
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("password must be at most {max} characters")]
    PasswordTooLong { max: usize },
    #[error("avatar URL must be at most {max} characters")]
    AvatarUrlTooLong { max: usize },
    #[error("avatar URL must start with http:// or https://")]
    AvatarUrlInvalidScheme,
    #[error("extra data must be a JSON object")]
    ExtraDataNotObject,
}

impl UserValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::InvalidEmail | Self::EmailTooLong { .. } => "email",
            Self::UsernameTooShort { .. }
            | Self::UsernameTooLong { .. }
            | Self::UsernameInvalidCharacters => "username",
            Self::FullNameTooLong { .. } => "fullName",
            Self::PasswordTooShort { .. } | Self::PasswordTooLong { .. } => "password",
            Self::AvatarUrlTooLong { .. } | Self::AvatarUrlInvalidScheme => "avatarUrl",
            Self::ExtraDataNotObject => "extraData",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_uuid",
            Self::InvalidEmail => "invalid_email",
            Self::EmailTooLong { .. }
            | Self::UsernameTooLong { .. }
            | Self::FullNameTooLong { .. }
            | Self::PasswordTooLong { .. }
            | Self::AvatarUrlTooLong { .. } => "too_long",
            Self::UsernameTooShort { .. } | Self::PasswordTooShort { .. } => "too_short",
            Self::UsernameInvalidCharacters => "invalid_characters",
            Self::AvatarUrlInvalidScheme => "invalid_url",
            Self::ExtraDataNotObject => "invalid_type",
        }
    }
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a user id from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email address, normalised to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into().trim().to_lowercase();
        if email.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let mut parts = email.split('@');
        let well_formed = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
            }
            _ => false,
        };
        if !well_formed {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[A-Za-z0-9_.-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Public handle, unique across users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate a username.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Plain-text password, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(Zeroizing<String>);

impl PlainPassword {
    /// Validate password length.
    pub fn new(password: impl Into<String>) -> Result<Self, UserValidationError> {
        let password = Zeroizing::new(password.into());
        let length = password.chars().count();
        if length < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(UserValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(password))
    }

    /// Borrow the secret for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(**redacted**)")
    }
}

/// Encoded password hash (PHC string format).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a [`PasswordHasher`](crate::domain::ports::PasswordHasher).
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The encoded hash.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(**redacted**)")
    }
}

/// Validate an optional full name.
pub fn validate_full_name(value: Option<String>) -> Result<Option<String>, UserValidationError> {
    match value {
        Some(name) if name.chars().count() > FULL_NAME_MAX => {
            Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX })
        }
        other => Ok(other),
    }
}

/// Validate an optional avatar URL.
pub fn validate_avatar_url(value: Option<String>) -> Result<Option<String>, UserValidationError> {
    let Some(url) = value else {
        return Ok(None);
    };
    if url.chars().count() > AVATAR_URL_MAX {
        return Err(UserValidationError::AvatarUrlTooLong {
            max: AVATAR_URL_MAX,
        });
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(UserValidationError::AvatarUrlInvalidScheme);
    }
    Ok(Some(url))
}

/// Validate free-form extra data, defaulting to an empty object.
pub fn validate_extra_data(value: Option<Value>) -> Result<Value, UserValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(object @ Value::Object(_)) => Ok(object),
        Some(_) => Err(UserValidationError::ExtraDataNotObject),
    }
}

/// Application user.
///
/// ## Invariants
/// - `email` is lower case and unique across users.
/// - `username` is unique across users.
/// - `hashed_password` is never serialised.
/// - `extra_data` is always a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, format = Uuid)]
    pub id: UserId,
    #[schema(value_type = String, example = "ada@example.com")]
    pub email: Email,
    #[schema(value_type = String, example = "ada")]
    pub username: Username,
    pub full_name: Option<String>,
    #[serde(skip)]
    pub hashed_password: PasswordHash,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Object)]
    pub extra_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may authenticate.
    pub fn is_authenticated(&self) -> bool {
        self.is_active && self.is_verified
    }
}

/// Validated input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub username: Username,
    pub password: PlainPassword,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub extra_data: Value,
}

/// Validated partial update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<Email>,
    pub username: Option<Username>,
    pub password: Option<PlainPassword>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub extra_data: Option<Value>,
}

impl UserChanges {
    /// Apply every field except the password, which callers hash first.
    pub fn apply_to(self, user: &mut User) -> Option<PlainPassword> {
        let Self {
            email,
            username,
            password,
            full_name,
            is_active,
            is_superuser,
            is_verified,
            avatar_url,
            bio,
            extra_data,
        } = self;

        if let Some(email) = email {
            user.email = email;
        }
        if let Some(username) = username {
            user.username = username;
        }
        if full_name.is_some() {
            user.full_name = full_name;
        }
        if let Some(flag) = is_active {
            user.is_active = flag;
        }
        if let Some(flag) = is_superuser {
            user.is_superuser = flag;
        }
        if let Some(flag) = is_verified {
            user.is_verified = flag;
        }
        if avatar_url.is_some() {
            user.avatar_url = avatar_url;
        }
        if bio.is_some() {
            user.bio = bio;
        }
        if let Some(extra) = extra_data {
            user.extra_data = extra;
        }
        password
    }
}
