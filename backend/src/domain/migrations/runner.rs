//! Migration use cases over the revision source and the migration store.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::plan::{self, HistoryEntry, MigrationStep};
use super::script::{self, file_name, generate_revision_id, render_revision, single_line};
use super::{MigrationError, Revision, RevisionGraph, RevisionId, Target};
use crate::domain::ports::{MigrationStore, RevisionSource};

/// Table whose presence marks a database created before migrations were
/// tracked.
pub const SENTINEL_TABLE: &str = "users";

/// Outcome of writing a new revision script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRevision {
    pub id: RevisionId,
    pub parents: Vec<RevisionId>,
    pub path: String,
}

/// A stamped version row and how it relates to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRevision {
    pub id: RevisionId,
    pub is_head: bool,
    pub known: bool,
}

/// Branch taken by [`MigrationRunner::auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoBranch {
    /// Empty database: every revision ran.
    FreshInstall,
    /// Untracked but populated database: stamped at head first.
    StampedExisting,
    /// Tracked database: pending revisions ran.
    Upgrade,
}

impl AutoBranch {
    /// Stable label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreshInstall => "fresh_install",
            Self::StampedExisting => "stamped_existing",
            Self::Upgrade => "upgrade",
        }
    }
}

/// Result of smart startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoOutcome {
    pub branch: AutoBranch,
    pub applied: Vec<RevisionId>,
}

/// Runs migration commands.
///
/// # Examples
/// ```ignore
/// let runner = MigrationRunner::new(store, source, Arc::new(DefaultClock));
/// let applied = runner.upgrade(&"head".parse()?).await?;
/// ```
#[derive(Clone)]
pub struct MigrationRunner<S, R> {
    store: Arc<S>,
    source: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<S, R> MigrationRunner<S, R>
where
    S: MigrationStore,
    R: RevisionSource,
{
    /// Create a runner.
    pub fn new(store: Arc<S>, source: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            source,
            clock,
        }
    }

    /// Parse every script and validate the graph.
    pub fn load_graph(&self) -> Result<RevisionGraph, MigrationError> {
        load_graph(self.source.as_ref())
    }

    /// Write a revision on top of the single head (or `head`, when given).
    pub fn revision(
        &self,
        message: &str,
        head: Option<&str>,
        empty: bool,
    ) -> Result<CreatedRevision, MigrationError> {
        let message = single_line(message);
        let graph = self.load_graph()?;
        let parents = match head {
            Some(raw) => vec![graph.lookup(raw)?],
            None => graph.single_head()?.into_iter().collect(),
        };
        let (upgrade, downgrade) = if empty {
            (String::new(), String::new())
        } else {
            (
                format!("-- upgrade statements for: {message}"),
                format!("-- downgrade statements for: {message}"),
            )
        };
        self.write_revision(&message, parents, upgrade, downgrade)
    }

    /// Write a merge revision joining `revisions`, or every head when empty.
    pub fn merge(
        &self,
        message: &str,
        revisions: &[String],
    ) -> Result<CreatedRevision, MigrationError> {
        let graph = self.load_graph()?;
        let parents = if revisions.is_empty() {
            graph.heads()
        } else {
            revisions
                .iter()
                .map(|raw| graph.lookup(raw))
                .collect::<Result<Vec<_>, _>>()?
        };
        if parents.len() < 2 {
            return Err(MigrationError::MergeNeedsTwoRevisions {
                found: parents.len(),
            });
        }
        self.write_revision(message, parents, String::new(), String::new())
    }

    fn write_revision(
        &self,
        message: &str,
        parents: Vec<RevisionId>,
        upgrade: String,
        downgrade: String,
    ) -> Result<CreatedRevision, MigrationError> {
        let revision = Revision {
            id: generate_revision_id(),
            parents,
            message: single_line(message),
            created_at: Some(self.clock.utc()),
            upgrade,
            downgrade,
        };
        let name = file_name(&revision.id, &revision.message);
        let path = self.source.create(&name, &render_revision(&revision))?;
        info!(revision = %revision.id, path = %path, "revision script written");
        Ok(CreatedRevision {
            id: revision.id,
            parents: revision.parents,
            path,
        })
    }

    /// Run every pending step up to `target`.
    pub async fn upgrade(&self, target: &Target) -> Result<Vec<RevisionId>, MigrationError> {
        let graph = self.load_graph()?;
        let rows = self.store.current_heads().await?;
        let steps = plan::plan_upgrade(&graph, &rows, target)?;
        self.execute(steps).await
    }

    /// Revert applied steps down to `target`.
    pub async fn downgrade(&self, target: &Target) -> Result<Vec<RevisionId>, MigrationError> {
        let graph = self.load_graph()?;
        let rows = self.store.current_heads().await?;
        let steps = plan::plan_downgrade(&graph, &rows, target)?;
        self.execute(steps).await
    }

    /// SQL an upgrade would run, starting from `from` (default: empty).
    pub fn upgrade_sql(&self, target: &Target, from: Option<&str>) -> Result<String, MigrationError> {
        let graph = self.load_graph()?;
        let rows = offline_rows(&graph, from)?;
        let steps = plan::plan_upgrade(&graph, &rows, target)?;
        Ok(script::render_offline(&steps))
    }

    /// SQL a downgrade would run, starting from `from` (default: all heads).
    pub fn downgrade_sql(
        &self,
        target: &Target,
        from: Option<&str>,
    ) -> Result<String, MigrationError> {
        let graph = self.load_graph()?;
        let rows = match from {
            Some(_) => offline_rows(&graph, from)?,
            None => graph.heads(),
        };
        let steps = plan::plan_downgrade(&graph, &rows, target)?;
        Ok(script::render_offline(&steps))
    }

    /// Replace the version rows without running any SQL.
    pub async fn stamp(&self, target: &Target) -> Result<Vec<RevisionId>, MigrationError> {
        let graph = self.load_graph()?;
        let rows = self.store.current_heads().await?;
        let stamped = plan::resolve_stamp(&graph, &rows, target)?;
        self.store.stamp(&stamped).await?;
        info!(revisions = %plan::join(&stamped), "database stamped");
        Ok(stamped)
    }

    /// Stamped rows, flagged against the graph.
    pub async fn current(&self) -> Result<Vec<CurrentRevision>, MigrationError> {
        let graph = self.load_graph()?;
        let heads = graph.heads();
        let rows = self.store.current_heads().await?;
        Ok(rows
            .into_iter()
            .map(|id| CurrentRevision {
                is_head: heads.contains(&id),
                known: graph.get(&id).is_some(),
                id,
            })
            .collect())
    }

    /// Every revision newest first, marking the stamped ones.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, MigrationError> {
        let graph = self.load_graph()?;
        let rows = self.store.current_heads().await?;
        Ok(plan::history(&graph, &rows))
    }

    /// Heads of the revision graph.
    pub fn heads(&self) -> Result<Vec<RevisionId>, MigrationError> {
        Ok(self.load_graph()?.heads())
    }

    /// Smart startup: bring any database to `head`.
    ///
    /// An untracked database that already holds the schema is stamped at
    /// head rather than having its tables recreated.
    pub async fn auto(&self) -> Result<AutoOutcome, MigrationError> {
        let tracked = !self.store.current_heads().await?.is_empty();
        let branch = if tracked {
            AutoBranch::Upgrade
        } else if self.store.table_exists(SENTINEL_TABLE).await? {
            warn!(
                table = SENTINEL_TABLE,
                "untracked database already has tables; stamping head"
            );
            self.stamp(&Target::Head).await?;
            AutoBranch::StampedExisting
        } else {
            AutoBranch::FreshInstall
        };
        let applied = self.upgrade(&Target::Head).await?;
        info!(
            branch = branch.as_str(),
            applied = applied.len(),
            "migrations reconciled"
        );
        Ok(AutoOutcome { branch, applied })
    }

    async fn execute(&self, steps: Vec<MigrationStep>) -> Result<Vec<RevisionId>, MigrationError> {
        let mut done = Vec::with_capacity(steps.len());
        for step in steps {
            info!(
                revision = %step.revision,
                direction = %step.direction,
                message = %step.message,
                "running migration"
            );
            self.store
                .apply(&step.sql, &step.heads_after)
                .await
                .map_err(|err| MigrationError::StepFailed {
                    revision: step.revision.to_string(),
                    message: err.to_string(),
                })?;
            done.push(step.revision);
        }
        Ok(done)
    }
}

/// Parse every script from `source` into a validated graph.
pub fn load_graph<R>(source: &R) -> Result<RevisionGraph, MigrationError>
where
    R: RevisionSource + ?Sized,
{
    let revisions = source
        .load()?
        .iter()
        .map(|file| script::parse_revision(&file.name, &file.contents))
        .collect::<Result<Vec<_>, _>>()?;
    RevisionGraph::new(revisions)
}

fn offline_rows(graph: &RevisionGraph, from: Option<&str>) -> Result<Vec<RevisionId>, MigrationError> {
    match from {
        None | Some("base") => Ok(Vec::new()),
        Some(raw) => Ok(vec![graph.lookup(raw)?]),
    }
}

#[cfg(test)]
mod tests;
