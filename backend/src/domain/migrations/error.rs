//! Errors raised while loading, planning and running migrations.

use crate::domain::Error;
use crate::domain::ports::{MigrationStoreError, RevisionSourceError};

/// Migration failures.
///
/// Recovery guidance for the operational cases lives in `docs/migrations.md`:
/// unknown stamped revisions are fixed with `current` then `stamp`, multiple
/// heads with `merge`, failed steps by fixing the script and re-running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("invalid revision id '{id}': expected 1-32 characters of [A-Za-z0-9_]")]
    InvalidRevisionId { id: String },
    #[error("revision {id} is defined more than once")]
    DuplicateRevision { id: String },
    #[error("revision {revision} names unknown parent {parent}")]
    MissingParent { revision: String, parent: String },
    #[error("revision graph contains a cycle through: {}", .revisions.join(", "))]
    Cycle { revisions: Vec<String> },
    #[error("no such revision '{target}'")]
    UnknownRevision { target: String },
    #[error("revision prefix '{prefix}' is ambiguous: {}", .candidates.join(", "))]
    AmbiguousRevision {
        prefix: String,
        candidates: Vec<String>,
    },
    #[error("multiple heads present ({}); use a specific revision, 'heads', or merge them", .heads.join(", "))]
    MultipleHeads { heads: Vec<String> },
    #[error("invalid migration target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("revision {revision} is not applied")]
    NotApplied { revision: String },
    #[error("cannot step {steps} revision(s) below base")]
    BelowBase { steps: u32 },
    #[error("cannot step {steps} revision(s) past the head")]
    BeyondHead { steps: u32 },
    #[error("relative step from {revision} is ambiguous: it has several candidates")]
    AmbiguousStep { revision: String },
    #[error("merge needs at least two revisions, found {found}")]
    MergeNeedsTwoRevisions { found: usize },
    #[error("{file}: {reason}")]
    Script { file: String, reason: String },
    #[error("migration {revision} failed: {message}")]
    StepFailed { revision: String, message: String },
    #[error(transparent)]
    Store(#[from] MigrationStoreError),
    #[error(transparent)]
    Source(#[from] RevisionSourceError),
}

impl MigrationError {
    pub(crate) fn script(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Script {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

impl From<MigrationError> for Error {
    fn from(value: MigrationError) -> Self {
        match value {
            MigrationError::Store(MigrationStoreError::Connection { message }) => {
                Error::service_unavailable(format!("database unavailable: {message}"))
            }
            other => Error::internal(other.to_string()),
        }
    }
}
