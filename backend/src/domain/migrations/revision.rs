//! Revision identifiers and revision records.

use std::fmt;

use chrono::{DateTime, Utc};

use super::MigrationError;

/// Maximum identifier length; matches the version table column width.
pub const REVISION_ID_MAX: usize = 32;

/// Identifier of a revision: 1..=32 characters of `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionId(String);

impl RevisionId {
    /// Validate a revision identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, MigrationError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= REVISION_ID_MAX
            && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if !valid {
            return Err(MigrationError::InvalidRevisionId { id });
        }
        Ok(Self(id))
    }

    /// Wrap an identifier already known to be well formed.
    pub(super) fn from_trusted(id: String) -> Self {
        Self(id)
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RevisionId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// One schema change with its forward and reverse SQL.
///
/// Zero parents marks a root revision (a child of `base`); two or more
/// parents marks a merge revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: RevisionId,
    pub parents: Vec<RevisionId>,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
    pub upgrade: String,
    pub downgrade: String,
}

impl Revision {
    /// Whether the revision joins several branches.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Whether the revision starts a chain from `base`.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}
