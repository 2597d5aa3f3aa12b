//! Planning upgrades, downgrades, stamps and history over a revision graph.
//!
//! A database's state is the set of rows in the version table: the heads of
//! the applied subgraph. The applied set is those rows plus every ancestor.

use std::collections::BTreeSet;
use std::fmt;

use super::{MigrationError, RevisionGraph, RevisionId, Target};

/// Direction a step runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upgrade => f.write_str("upgrade"),
            Self::Downgrade => f.write_str("downgrade"),
        }
    }
}

/// One revision body to run, with the version rows that hold afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub revision: RevisionId,
    pub parents: Vec<RevisionId>,
    pub message: String,
    pub direction: Direction,
    pub sql: String,
    pub heads_after: Vec<RevisionId>,
}

/// Row of `migrate history` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub revision: RevisionId,
    pub parents: Vec<RevisionId>,
    pub message: String,
    pub is_head: bool,
    pub is_merge: bool,
    pub is_branch_point: bool,
    pub is_current: bool,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parents = if self.parents.is_empty() {
            "<base>".to_owned()
        } else {
            join(&self.parents)
        };
        write!(f, "{parents} -> {}", self.revision)?;
        let mut flags = Vec::new();
        if self.is_head {
            flags.push("head");
        }
        if self.is_merge {
            flags.push("mergepoint");
        }
        if self.is_branch_point {
            flags.push("branchpoint");
        }
        if self.is_current {
            flags.push("current");
        }
        if !flags.is_empty() {
            write!(f, " ({})", flags.join(", "))?;
        }
        write!(f, ", {}", self.message)
    }
}

/// Comma-separated ids.
pub fn join(ids: &[RevisionId]) -> String {
    ids.iter()
        .map(RevisionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Steps needed to reach `target` from the stamped `rows`.
///
/// Every ancestor-or-self of the target that is not applied runs in
/// topological order.
pub fn plan_upgrade(
    graph: &RevisionGraph,
    rows: &[RevisionId],
    target: &Target,
) -> Result<Vec<MigrationStep>, MigrationError> {
    let mut applied = graph.applied_set(rows)?;
    let destinations = upgrade_destinations(graph, &applied, target)?;

    let mut needed = BTreeSet::new();
    for destination in &destinations {
        needed.extend(graph.lineage(destination));
    }

    let mut steps = Vec::new();
    for id in graph.topological_order() {
        if !needed.contains(id) || applied.contains(id) {
            continue;
        }
        applied.insert(id.clone());
        steps.push(step(graph, id, Direction::Upgrade, &applied)?);
    }
    Ok(steps)
}

/// Steps removing every applied revision not in the target's lineage, in
/// reverse topological order.
pub fn plan_downgrade(
    graph: &RevisionGraph,
    rows: &[RevisionId],
    target: &Target,
) -> Result<Vec<MigrationStep>, MigrationError> {
    let mut applied = graph.applied_set(rows)?;
    let keep = downgrade_keep_set(graph, &applied, target)?;

    let mut steps = Vec::new();
    for id in graph.topological_order().iter().rev() {
        if keep.contains(id) || !applied.contains(id) {
            continue;
        }
        applied.remove(id);
        steps.push(step(graph, id, Direction::Downgrade, &applied)?);
    }
    Ok(steps)
}

/// Version rows that stamping `target` would write.
///
/// Absolute targets do not consult the current rows, so stamping also
/// recovers a database that references revisions no longer on disk.
pub fn resolve_stamp(
    graph: &RevisionGraph,
    rows: &[RevisionId],
    target: &Target,
) -> Result<Vec<RevisionId>, MigrationError> {
    match target {
        Target::Base => Ok(Vec::new()),
        Target::Head => Ok(graph.single_head()?.into_iter().collect()),
        Target::Heads => Ok(graph.heads()),
        Target::Revision(raw) => Ok(vec![graph.lookup(raw)?]),
        Target::Relative(steps) if *steps > 0 => {
            let plan = plan_upgrade(graph, rows, target)?;
            Ok(plan
                .last()
                .map(|step| step.heads_after.clone())
                .unwrap_or_else(|| rows.to_vec()))
        }
        Target::Relative(_) => {
            let plan = plan_downgrade(graph, rows, target)?;
            Ok(plan
                .last()
                .map(|step| step.heads_after.clone())
                .unwrap_or_else(|| rows.to_vec()))
        }
    }
}

/// Revisions newest first, flagged against the stamped `rows`.
pub fn history(graph: &RevisionGraph, rows: &[RevisionId]) -> Vec<HistoryEntry> {
    let heads: BTreeSet<RevisionId> = graph.heads().into_iter().collect();
    let current: BTreeSet<&RevisionId> = rows.iter().collect();
    graph
        .topological_order()
        .iter()
        .rev()
        .filter_map(|id| graph.get(id))
        .map(|revision| HistoryEntry {
            revision: revision.id.clone(),
            parents: revision.parents.clone(),
            message: revision.message.clone(),
            is_head: heads.contains(&revision.id),
            is_merge: revision.is_merge(),
            is_branch_point: graph.children(&revision.id).len() > 1,
            is_current: current.contains(&revision.id),
        })
        .collect()
}

fn upgrade_destinations(
    graph: &RevisionGraph,
    applied: &BTreeSet<RevisionId>,
    target: &Target,
) -> Result<Vec<RevisionId>, MigrationError> {
    match target {
        Target::Head => Ok(graph.single_head()?.into_iter().collect()),
        Target::Heads => Ok(graph.heads()),
        Target::Base => Ok(Vec::new()),
        Target::Revision(raw) => Ok(vec![graph.lookup(raw)?]),
        Target::Relative(steps) if *steps > 0 => {
            step_forward(graph, applied, steps.unsigned_abs()).map(|id| vec![id])
        }
        Target::Relative(_) => Err(MigrationError::invalid_target(
            target.to_string(),
            "upgrade needs +N, not -N",
        )),
    }
}

fn step_forward(
    graph: &RevisionGraph,
    applied: &BTreeSet<RevisionId>,
    steps: u32,
) -> Result<RevisionId, MigrationError> {
    let mut cursor = single_current(graph, applied)?;
    for _ in 0..steps {
        let candidates = match &cursor {
            Some(id) => graph.children(id),
            None => graph.bases(),
        };
        cursor = match candidates.as_slice() {
            [] => return Err(MigrationError::BeyondHead { steps }),
            [next] => Some(next.clone()),
            _ => {
                return Err(MigrationError::AmbiguousStep {
                    revision: cursor.map_or_else(|| "base".to_owned(), |id| id.to_string()),
                });
            }
        };
    }
    cursor.ok_or(MigrationError::BeyondHead { steps })
}

fn downgrade_keep_set(
    graph: &RevisionGraph,
    applied: &BTreeSet<RevisionId>,
    target: &Target,
) -> Result<BTreeSet<RevisionId>, MigrationError> {
    let destinations = match target {
        Target::Base => Vec::new(),
        Target::Head => graph.single_head()?.into_iter().collect(),
        Target::Heads => graph.heads(),
        Target::Revision(raw) => vec![graph.lookup(raw)?],
        Target::Relative(steps) if *steps < 0 => {
            step_backward(graph, applied, steps.unsigned_abs())?
        }
        Target::Relative(_) => {
            return Err(MigrationError::invalid_target(
                target.to_string(),
                "downgrade needs -N, not +N",
            ));
        }
    };

    let mut keep = BTreeSet::new();
    for destination in destinations {
        if !applied.contains(&destination) {
            return Err(MigrationError::NotApplied {
                revision: destination.to_string(),
            });
        }
        keep.extend(graph.lineage(&destination));
    }
    Ok(keep)
}

/// Walk `steps` revisions down from the single current head.
///
/// Stepping below a merge lands on all of its parents, so the following step
/// has several candidates.
fn step_backward(
    graph: &RevisionGraph,
    applied: &BTreeSet<RevisionId>,
    steps: u32,
) -> Result<Vec<RevisionId>, MigrationError> {
    let mut frontier: Vec<RevisionId> = single_current(graph, applied)?.into_iter().collect();
    for _ in 0..steps {
        let id = match frontier.as_slice() {
            [] => return Err(MigrationError::BelowBase { steps }),
            [id] => id.clone(),
            many => {
                return Err(MigrationError::AmbiguousStep {
                    revision: join(many),
                });
            }
        };
        frontier = graph
            .get(&id)
            .map(|revision| revision.parents.clone())
            .unwrap_or_default();
    }
    Ok(frontier)
}

fn single_current(
    graph: &RevisionGraph,
    applied: &BTreeSet<RevisionId>,
) -> Result<Option<RevisionId>, MigrationError> {
    let heads = graph.heads_of(applied);
    match heads.as_slice() {
        [] => Ok(None),
        [head] => Ok(Some(head.clone())),
        many => Err(MigrationError::MultipleHeads {
            heads: many.iter().map(ToString::to_string).collect(),
        }),
    }
}

fn step(
    graph: &RevisionGraph,
    id: &RevisionId,
    direction: Direction,
    applied_after: &BTreeSet<RevisionId>,
) -> Result<MigrationStep, MigrationError> {
    let revision = graph
        .get(id)
        .ok_or_else(|| MigrationError::UnknownRevision {
            target: id.to_string(),
        })?;
    let sql = match direction {
        Direction::Upgrade => revision.upgrade.clone(),
        Direction::Downgrade => revision.downgrade.clone(),
    };
    Ok(MigrationStep {
        revision: id.clone(),
        parents: revision.parents.clone(),
        message: revision.message.clone(),
        direction,
        sql,
        heads_after: graph.heads_of(applied_after),
    })
}
