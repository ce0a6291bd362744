//! # Kinship Coefficients
//!
//! Exact coefficients of relatedness over the parent DAG, and the branch
//! structure behind them.
//!
//! - `KinshipCache::kinship`: the kinship (coancestry) coefficient of a pair
//! - `KinshipCache::inbreeding`: a person's inbreeding coefficient, i.e. the
//!   kinship of its parents
//! - `relationship_summary`: the coefficient together with every nearest
//!   common ancestor and the ancestral lines from it down to each subject
//!
//! Values are `Coefficient`s, exact `n / 2^k` fractions.

mod cache;
mod coefficient;

pub use cache::KinshipCache;
pub use coefficient::Coefficient;

use crate::graph::KinshipGraph;
use crate::primitives::MAX_ANCESTOR_DEPTH;
use crate::{LineageError, PersonId, PersonKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SUMMARY TYPES
// =============================================================================

/// All ancestral lines of one length from a common ancestor to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPath {
    /// Parent edges between the ancestor and the subject.
    pub length: u32,
    /// How many distinct lines have this length.
    pub multiplicity: u64,
    /// One such line, ancestor first and subject last. Where lines fork,
    /// the child with the smallest key is taken.
    pub path: Vec<PersonKey>,
}

/// A nearest common ancestor and its lines to both subjects, shortest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestorLinks {
    pub ancestor: PersonKey,
    pub paths_to_a: Vec<BranchPath>,
    pub paths_to_b: Vec<BranchPath>,
}

impl AncestorLinks {
    /// Length of the shortest line to each subject.
    #[must_use]
    pub fn distances(&self) -> Option<(u32, u32)> {
        Some((self.paths_to_a.first()?.length, self.paths_to_b.first()?.length))
    }
}

/// Kinship coefficient of a pair plus the ancestry that produces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSummary {
    pub subject_a: PersonKey,
    pub subject_b: PersonKey,
    pub coefficient: Coefficient,
    /// Ranked like `classify`: total distance, then the longer side, then key.
    pub ancestors: Vec<AncestorLinks>,
}

// =============================================================================
// ANCESTRAL LINES
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Reach {
    count: u64,
    via: Option<PersonId>,
}

/// `layers[n]` holds every ancestor `n` parent edges above `subject`, with
/// the number of distinct lines of that length and the child it was first
/// reached from.
fn ancestral_lines(
    graph: &KinshipGraph,
    subject: PersonId,
    max_depth: u32,
) -> Vec<BTreeMap<PersonId, Reach>> {
    let mut layers = vec![BTreeMap::from([(
        subject,
        Reach {
            count: 1,
            via: None,
        },
    )])];

    for _ in 0..max_depth {
        let Some(current) = layers.last() else {
            break;
        };
        let mut next: BTreeMap<PersonId, Reach> = BTreeMap::new();
        for (&child, reach) in current {
            for parent in graph.parent_ids(child).iter() {
                let slot = next.entry(*parent).or_insert(Reach {
                    count: 0,
                    via: Some(child),
                });
                slot.count = slot.count.saturating_add(reach.count);
            }
        }
        if next.is_empty() {
            break;
        }
        layers.push(next);
    }
    layers
}

/// Every line length from `ancestor` down, with its representative chain.
fn branch_paths(
    graph: &KinshipGraph,
    layers: &[BTreeMap<PersonId, Reach>],
    ancestor: PersonId,
) -> Vec<BranchPath> {
    let mut paths = Vec::new();
    for (length, layer) in layers.iter().enumerate() {
        let Some(reach) = layer.get(&ancestor) else {
            continue;
        };
        let mut path = vec![graph.key_of(ancestor).clone()];
        let mut via = reach.via;
        let mut depth = length;
        while let (Some(child), Some(below)) = (via, depth.checked_sub(1)) {
            path.push(graph.key_of(child).clone());
            via = layers
                .get(below)
                .and_then(|layer| layer.get(&child))
                .and_then(|r| r.via);
            depth = below;
        }
        paths.push(BranchPath {
            length: length as u32,
            multiplicity: reach.count,
            path,
        });
    }
    paths
}

fn reached(layers: &[BTreeMap<PersonId, Reach>]) -> BTreeSet<PersonId> {
    layers.iter().flat_map(|layer| layer.keys().copied()).collect()
}

/// Proper ancestors of any of `persons`, over the whole graph.
fn ancestors_above(graph: &KinshipGraph, persons: &BTreeSet<PersonId>) -> BTreeSet<PersonId> {
    let mut above = BTreeSet::new();
    let mut frontier: Vec<PersonId> = persons.iter().copied().collect();
    while let Some(id) = frontier.pop() {
        for parent in graph.parent_ids(id).iter() {
            if above.insert(*parent) {
                frontier.push(*parent);
            }
        }
    }
    above
}

// =============================================================================
// QUERIES
// =============================================================================

/// Kinship coefficient of `a` and `b` with their nearest common ancestors.
///
/// A common ancestor is nearest when it is not itself an ancestor of another
/// common ancestor. Lines are followed up to `max_depth` parent edges (capped
/// at `MAX_ANCESTOR_DEPTH`); the coefficient always covers the whole graph.
pub fn relationship_summary(
    cache: &KinshipCache,
    a: &PersonKey,
    b: &PersonKey,
    max_depth: u32,
) -> Result<RelationshipSummary, LineageError> {
    let graph = cache.graph();
    let id_a = graph.require(a)?;
    let id_b = graph.require(b)?;
    let max_depth = max_depth.min(MAX_ANCESTOR_DEPTH);

    let lines_a = ancestral_lines(graph, id_a, max_depth);
    let lines_b = ancestral_lines(graph, id_b, max_depth);
    let common: BTreeSet<PersonId> = reached(&lines_a)
        .intersection(&reached(&lines_b))
        .copied()
        .collect();
    let above = ancestors_above(graph, &common);

    let mut ancestors: Vec<AncestorLinks> = common
        .iter()
        .filter(|id| !above.contains(*id))
        .map(|&id| AncestorLinks {
            ancestor: graph.key_of(id).clone(),
            paths_to_a: branch_paths(graph, &lines_a, id),
            paths_to_b: branch_paths(graph, &lines_b, id),
        })
        .collect();
    // `common` iterates in key order and the sort is stable, so equal
    // distances keep that order.
    ancestors.sort_by_key(|links| {
        links
            .distances()
            .map(|(da, db)| (da + db, da.max(db)))
            .unwrap_or((u32::MAX, u32::MAX))
    });

    let coefficient = cache.kinship_of(id_a, id_b);
    tracing::debug!(
        a = %a,
        b = %b,
        coefficient = %coefficient,
        ancestors = ancestors.len(),
        "relationship summarized"
    );

    Ok(RelationshipSummary {
        subject_a: a.clone(),
        subject_b: b.clone(),
        coefficient,
        ancestors,
    })
}

/// Inbreeding coefficient of every person, in key order.
pub fn inbreeding_coefficients(cache: &KinshipCache) -> BTreeMap<PersonKey, Coefficient> {
    let graph = cache.graph();
    let mut ids: Vec<PersonId> = graph
        .keys()
        .filter_map(|key| graph.require(key).ok())
        .collect();
    // Founders first, so each evaluation reuses its parents' pairs.
    ids.sort_by_key(|id| (graph.depth_of(*id), *id));

    let coefficients: BTreeMap<PersonKey, Coefficient> = ids
        .into_iter()
        .map(|id| (graph.key_of(id).clone(), cache.inbreeding_of(id)))
        .collect();
    tracing::debug!(
        version = %cache.version(),
        persons = coefficients.len(),
        inbred = coefficients.values().filter(|f| !f.is_zero()).count(),
        "inbreeding coefficients computed"
    );
    coefficients
}

// =============================================================================
// TESTS
// =============================================================================
