//! Validated revision graph and target resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::{MigrationError, Revision, RevisionId};

/// Where a migration command should take the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The single head; fails when the graph has several.
    Head,
    /// Every head.
    Heads,
    /// Before the first revision.
    Base,
    /// A full revision id or a unique prefix of one.
    Revision(String),
    /// `+N` / `-N` steps relative to the current head.
    Relative(i32),
}

impl FromStr for Target {
    type Err = MigrationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        match raw {
            "head" => return Ok(Self::Head),
            "heads" => return Ok(Self::Heads),
            "base" => return Ok(Self::Base),
            _ => {}
        }
        if let Some(sign) = raw.chars().next().filter(|c| *c == '+' || *c == '-') {
            let steps: i32 = raw[1..].parse().map_err(|_| {
                MigrationError::invalid_target(raw, "relative steps must be a positive integer")
            })?;
            if steps <= 0 {
                return Err(MigrationError::invalid_target(
                    raw,
                    "relative steps must be a positive integer",
                ));
            }
            return Ok(Self::Relative(if sign == '-' { -steps } else { steps }));
        }
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(MigrationError::invalid_target(
                raw,
                "expected head, heads, base, +N, -N or a revision id",
            ));
        }
        Ok(Self::Revision(raw.to_owned()))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Heads => f.write_str("heads"),
            Self::Base => f.write_str("base"),
            Self::Revision(id) => f.write_str(id),
            Self::Relative(steps) => write!(f, "{steps:+}"),
        }
    }
}

/// Directed acyclic graph of revisions, edges pointing parent to child.
#[derive(Debug, Clone, Default)]
pub struct RevisionGraph {
    revisions: BTreeMap<RevisionId, Revision>,
    children: BTreeMap<RevisionId, BTreeSet<RevisionId>>,
    order: Vec<RevisionId>,
}

impl RevisionGraph {
    /// Build a graph, rejecting duplicate ids, dangling parents and cycles.
    pub fn new(revisions: Vec<Revision>) -> Result<Self, MigrationError> {
        let mut by_id = BTreeMap::new();
        for revision in revisions {
            let id = revision.id.clone();
            if by_id.insert(id.clone(), revision).is_some() {
                return Err(MigrationError::DuplicateRevision { id: id.to_string() });
            }
        }

        let mut children: BTreeMap<RevisionId, BTreeSet<RevisionId>> = by_id
            .keys()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();
        for revision in by_id.values() {
            for parent in &revision.parents {
                let Some(siblings) = children.get_mut(parent) else {
                    return Err(MigrationError::MissingParent {
                        revision: revision.id.to_string(),
                        parent: parent.to_string(),
                    });
                };
                siblings.insert(revision.id.clone());
            }
        }

        let order = topological_sort(&by_id, &children)?;
        Ok(Self {
            revisions: by_id,
            children,
            order,
        })
    }

    /// Whether the graph holds no revisions.
    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Look up a revision by exact id.
    pub fn get(&self, id: &RevisionId) -> Option<&Revision> {
        self.revisions.get(id)
    }

    /// Revisions without children, sorted by id.
    pub fn heads(&self) -> Vec<RevisionId> {
        self.children
            .iter()
            .filter(|(_, kids)| kids.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Revisions without parents, sorted by id.
    pub fn bases(&self) -> Vec<RevisionId> {
        self.revisions
            .values()
            .filter(|revision| revision.is_root())
            .map(|revision| revision.id.clone())
            .collect()
    }

    /// Direct children of `id`, sorted.
    pub fn children(&self, id: &RevisionId) -> Vec<RevisionId> {
        self.children
            .get(id)
            .map(|kids| kids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every transitive parent of `id`, excluding `id`.
    pub fn ancestors(&self, id: &RevisionId) -> BTreeSet<RevisionId> {
        self.walk(id, |current| {
            self.revisions
                .get(current)
                .map(|revision| revision.parents.clone())
                .unwrap_or_default()
        })
    }

    /// Every transitive child of `id`, excluding `id`.
    pub fn descendants(&self, id: &RevisionId) -> BTreeSet<RevisionId> {
        self.walk(id, |current| self.children(current))
    }

    /// `id` together with its ancestors.
    pub fn lineage(&self, id: &RevisionId) -> BTreeSet<RevisionId> {
        let mut set = self.ancestors(id);
        set.insert(id.clone());
        set
    }

    /// Parents before children; independent revisions ordered by id.
    pub fn topological_order(&self) -> &[RevisionId] {
        &self.order
    }

    /// Members of `set` with no child inside `set`.
    pub fn heads_of(&self, set: &BTreeSet<RevisionId>) -> Vec<RevisionId> {
        set.iter()
            .filter(|id| {
                self.children
                    .get(*id)
                    .is_none_or(|kids| kids.iter().all(|kid| !set.contains(kid)))
            })
            .cloned()
            .collect()
    }

    /// Resolve a full id or unique prefix to a revision id.
    pub fn lookup(&self, needle: &str) -> Result<RevisionId, MigrationError> {
        if let Some((id, _)) = self.revisions.iter().find(|(id, _)| id.as_str() == needle) {
            return Ok(id.clone());
        }
        let candidates: Vec<&RevisionId> = self
            .revisions
            .keys()
            .filter(|id| id.as_str().starts_with(needle))
            .collect();
        match candidates.as_slice() {
            [] => Err(MigrationError::UnknownRevision {
                target: needle.to_owned(),
            }),
            [single] => Ok((*single).clone()),
            many => Err(MigrationError::AmbiguousRevision {
                prefix: needle.to_owned(),
                candidates: many.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    /// The single head, or `MultipleHeads`. `None` for an empty graph.
    pub fn single_head(&self) -> Result<Option<RevisionId>, MigrationError> {
        let heads = self.heads();
        match heads.as_slice() {
            [] => Ok(None),
            [head] => Ok(Some(head.clone())),
            many => Err(MigrationError::MultipleHeads {
                heads: many.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    /// Expand version-table rows into the full applied set.
    ///
    /// Unknown rows fail with `UnknownRevision` so the operator can restamp.
    pub fn applied_set(&self, rows: &[RevisionId]) -> Result<BTreeSet<RevisionId>, MigrationError> {
        let mut applied = BTreeSet::new();
        for row in rows {
            if !self.revisions.contains_key(row) {
                return Err(MigrationError::UnknownRevision {
                    target: row.to_string(),
                });
            }
            applied.extend(self.lineage(row));
        }
        Ok(applied)
    }

    fn walk<F>(&self, start: &RevisionId, next: F) -> BTreeSet<RevisionId>
    where
        F: Fn(&RevisionId) -> Vec<RevisionId>,
    {
        let mut seen = BTreeSet::new();
        let mut stack = next(start);
        while let Some(current) = stack.pop() {
            if seen.insert(current.clone()) {
                stack.extend(next(&current));
            }
        }
        seen
    }
}

/// Kahn's algorithm with an ordered ready set so ties break by id.
fn topological_sort(
    revisions: &BTreeMap<RevisionId, Revision>,
    children: &BTreeMap<RevisionId, BTreeSet<RevisionId>>,
) -> Result<Vec<RevisionId>, MigrationError> {
    let mut pending: BTreeMap<&RevisionId, usize> = revisions
        .iter()
        .map(|(id, revision)| {
            let distinct: BTreeSet<&RevisionId> = revision.parents.iter().collect();
            (id, distinct.len())
        })
        .collect();
    let mut ready: BTreeSet<&RevisionId> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(revisions.len());

    while let Some(id) = ready.pop_first() {
        pending.remove(id);
        order.push(id.clone());
        for child in children.get(id).into_iter().flatten() {
            if let Some(count) = pending.get_mut(child) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(child);
                }
            }
        }
    }

    if !pending.is_empty() {
        return Err(MigrationError::Cycle {
            revisions: pending.keys().map(ToString::to_string).collect(),
        });
    }
    Ok(order)
}
