//! In-memory migration store and revision source.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::migrations::script::render_revision;
use crate::domain::migrations::{Revision, RevisionId};
use crate::domain::ports::{
    MigrationStore, MigrationStoreError, RevisionFile, RevisionSource, RevisionSourceError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a revision id, panicking on malformed input.
pub fn id(raw: &str) -> RevisionId {
    RevisionId::new(raw).unwrap_or_else(|err| panic!("fixture revision id {raw}: {err}"))
}

/// Revision with placeholder bodies `-- up <id>` / `-- down <id>`.
pub fn revision(raw: &str, parents: &[&str]) -> Revision {
    Revision {
        id: id(raw),
        parents: parents.iter().map(|parent| id(parent)).collect(),
        message: format!("revision {raw}"),
        created_at: None,
        upgrade: format!("-- up {raw}"),
        downgrade: format!("-- down {raw}"),
    }
}

/// Revision rendered as a script file.
pub fn revision_file(raw: &str, parents: &[&str]) -> RevisionFile {
    RevisionFile {
        name: format!("{raw}.sql"),
        contents: render_revision(&revision(raw, parents)),
    }
}

/// Revision scripts held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRevisionSource {
    files: Mutex<Vec<RevisionFile>>,
}

impl InMemoryRevisionSource {
    /// Source preloaded with `files`.
    pub fn with_files(files: Vec<RevisionFile>) -> Self {
        Self {
            files: Mutex::new(files),
        }
    }

    /// Snapshot of the stored files.
    pub fn files(&self) -> Vec<RevisionFile> {
        lock(&self.files).clone()
    }
}

impl RevisionSource for InMemoryRevisionSource {
    fn load(&self) -> Result<Vec<RevisionFile>, RevisionSourceError> {
        let mut files = lock(&self.files).clone();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn create(&self, name: &str, contents: &str) -> Result<String, RevisionSourceError> {
        let mut files = lock(&self.files);
        if files.iter().any(|file| file.name == name) {
            return Err(RevisionSourceError::already_exists(name));
        }
        files.push(RevisionFile {
            name: name.to_owned(),
            contents: contents.to_owned(),
        });
        Ok(format!("memory://{name}"))
    }
}

/// Version rows and executed SQL held in memory.
///
/// `apply` fails without side effects when the SQL contains the configured
/// failure marker, mirroring a rolled-back transaction.
#[derive(Debug, Default)]
pub struct InMemoryMigrationStore {
    rows: Mutex<Vec<RevisionId>>,
    tables: Mutex<BTreeSet<String>>,
    executed: Mutex<Vec<String>>,
    fail_marker: Mutex<Option<String>>,
}

impl InMemoryMigrationStore {
    /// Store whose version table already holds `rows`.
    pub fn with_rows(rows: &[&str]) -> Self {
        let store = Self::default();
        *lock(&store.rows) = rows.iter().map(|raw| id(raw)).collect();
        store
    }

    /// Pretend `table` already exists.
    pub fn add_table(&self, table: &str) {
        lock(&self.tables).insert(table.to_owned());
    }

    /// Fail any SQL containing `marker`.
    pub fn fail_on(&self, marker: &str) {
        *lock(&self.fail_marker) = Some(marker.to_owned());
    }

    /// Current version rows as strings.
    pub fn rows(&self) -> Vec<String> {
        lock(&self.rows).iter().map(ToString::to_string).collect()
    }

    /// SQL bodies executed so far.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).clone()
    }
}

#[async_trait]
impl MigrationStore for InMemoryMigrationStore {
    async fn current_heads(&self) -> Result<Vec<RevisionId>, MigrationStoreError> {
        Ok(lock(&self.rows).clone())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, MigrationStoreError> {
        Ok(lock(&self.tables).contains(table))
    }

    async fn apply(
        &self,
        sql: &str,
        heads_after: &[RevisionId],
    ) -> Result<(), MigrationStoreError> {
        if let Some(marker) = lock(&self.fail_marker).as_deref() {
            if sql.contains(marker) {
                return Err(MigrationStoreError::execution(format!(
                    "simulated failure at {marker}"
                )));
            }
        }
        lock(&self.executed).push(sql.to_owned());
        *lock(&self.rows) = heads_after.to_vec();
        Ok(())
    }

    async fn stamp(&self, heads: &[RevisionId]) -> Result<(), MigrationStoreError> {
        *lock(&self.rows) = heads.to_vec();
        Ok(())
    }
}
