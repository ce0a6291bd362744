//! # Consanguinity Calculator
//!
//! Classifies how two persons are related by blood: same person, direct
//! line, collateral (siblings, cousins, with removal), or unrelated.
//!
//! Each subject climbs its parent edges breadth-first up to `max_depth`,
//! recording the shortest distance to every ancestor. The closest common
//! ancestor is the one minimizing `distance_a + distance_b`, then
//! `max(distance_a, distance_b)`, then the ancestor key.

use crate::graph::KinshipGraph;
use crate::primitives::{DEFAULT_MAX_DEPTH, MAX_ANCESTOR_DEPTH};
use crate::{LineageError, PersonId, PersonKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

// =============================================================================
// OPTIONS AND RESULTS
// =============================================================================

/// Knobs for a single classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyOptions {
    /// Parent edges climbed per subject. Clamped to `MAX_ANCESTOR_DEPTH`.
    pub max_depth: u32,
    /// Report `DepthExceeded` instead of `Unrelated` when a search was cut off.
    pub distinguish_depth_exceeded: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            distinguish_depth_exceeded: false,
        }
    }
}

impl ClassifyOptions {
    /// Set the search depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Ask for `DepthExceeded` to be told apart from `Unrelated`.
    #[must_use]
    pub const fn distinguishing_depth_exceeded(mut self, on: bool) -> Self {
        self.distinguish_depth_exceeded = on;
        self
    }

    fn effective_depth(self) -> u32 {
        self.max_depth.min(MAX_ANCESTOR_DEPTH)
    }
}

/// Kind of blood relationship between two subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    /// Both keys name the same person.
    #[serde(rename = "SELF")]
    Same,
    /// One subject is an ancestor of the other.
    Direct,
    /// Siblings or cousins of some degree and removal.
    Collateral,
    /// No common ancestor exists.
    Unrelated,
    /// No common ancestor within the search depth, and the search was cut off.
    DepthExceeded,
}

/// Classification of one pair. Owned by the caller; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResult {
    pub subject_a: PersonKey,
    pub subject_b: PersonKey,
    pub common_ancestor: Option<PersonKey>,
    pub distance_a: Option<u32>,
    pub distance_b: Option<u32>,
    pub degree: Option<u32>,
    pub removal: Option<u32>,
    pub kind: RelationshipKind,
}

impl RelationshipResult {
    fn without_ancestor(a: &PersonKey, b: &PersonKey, kind: RelationshipKind) -> Self {
        Self {
            subject_a: a.clone(),
            subject_b: b.clone(),
            common_ancestor: None,
            distance_a: None,
            distance_b: None,
            degree: None,
            removal: None,
            kind,
        }
    }

    /// The same relationship seen from B's side.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            subject_a: self.subject_b.clone(),
            subject_b: self.subject_a.clone(),
            distance_a: self.distance_b,
            distance_b: self.distance_a,
            ..self.clone()
        }
    }

    /// True when the subjects share an ancestor (or are the same person).
    #[must_use]
    pub fn is_related(&self) -> bool {
        self.common_ancestor.is_some()
    }
}

/// A common ancestor of two subjects with its distance from each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAncestor {
    pub person: PersonKey,
    pub distance_a: u32,
    pub distance_b: u32,
}

/// Shortest distance from one subject to each of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorDistances {
    /// The subject itself is included at distance 0.
    pub distances: BTreeMap<PersonKey, u32>,
    /// Some ancestor at the depth limit still had a recorded parent.
    pub truncated: bool,
}

// =============================================================================
// ANCESTOR CLIMB
// =============================================================================

struct Climb {
    distances: BTreeMap<PersonId, u32>,
    truncated: bool,
}

/// Breadth-first climb along parent edges. The first visit of an ancestor is
/// its shortest distance.
fn climb(graph: &KinshipGraph, start: PersonId, max_depth: u32) -> Climb {
    let mut distances = BTreeMap::from([(start, 0u32)]);
    let mut frontier = vec![start];
    let mut depth = 0u32;

    while !frontier.is_empty() {
        if depth == max_depth {
            let truncated = frontier
                .iter()
                .any(|id| !graph.parent_ids(*id).is_empty());
            return Climb {
                distances,
                truncated,
            };
        }
        depth += 1;

        let mut next = Vec::new();
        for id in frontier {
            for parent in graph.parent_ids(id).iter() {
                if let Entry::Vacant(slot) = distances.entry(*parent) {
                    slot.insert(depth);
                    next.push(*parent);
                }
            }
        }
        frontier = next;
    }

    Climb {
        distances,
        truncated: false,
    }
}

/// Common ancestors as `(id, distance_a, distance_b)`, best first.
fn ranked_common(a: &Climb, b: &Climb) -> Vec<(PersonId, u32, u32)> {
    let mut common: Vec<(PersonId, u32, u32)> = a
        .distances
        .iter()
        .filter_map(|(id, da)| b.distances.get(id).map(|db| (*id, *da, *db)))
        .collect();
    // Ids are ordered like keys, so the last criterion is the key order.
    common.sort_by_key(|&(id, da, db)| (da + db, da.max(db), id));
    common
}

// =============================================================================
// QUERIES
// =============================================================================

/// The ancestor distance map of one subject.
pub fn ancestor_distances(
    graph: &KinshipGraph,
    subject: &PersonKey,
    max_depth: u32,
) -> Result<AncestorDistances, LineageError> {
    let id = graph.require(subject)?;
    let found = climb(graph, id, max_depth.min(MAX_ANCESTOR_DEPTH));
    Ok(AncestorDistances {
        distances: found
            .distances
            .into_iter()
            .map(|(id, distance)| (graph.key_of(id).clone(), distance))
            .collect(),
        truncated: found.truncated,
    })
}

/// Every common ancestor of `a` and `b` within `max_depth`, ranked by the
/// selection order `classify` uses. Direct-line ancestors are included.
pub fn common_ancestors(
    graph: &KinshipGraph,
    a: &PersonKey,
    b: &PersonKey,
    max_depth: u32,
) -> Result<Vec<CommonAncestor>, LineageError> {
    let id_a = graph.require(a)?;
    let id_b = graph.require(b)?;
    let depth = max_depth.min(MAX_ANCESTOR_DEPTH);
    let climb_a = climb(graph, id_a, depth);
    let climb_b = climb(graph, id_b, depth);

    Ok(ranked_common(&climb_a, &climb_b)
        .into_iter()
        .map(|(id, distance_a, distance_b)| CommonAncestor {
            person: graph.key_of(id).clone(),
            distance_a,
            distance_b,
        })
        .collect())
}

/// Classify the blood relationship of `a` and `b`.
pub fn classify(
    graph: &KinshipGraph,
    a: &PersonKey,
    b: &PersonKey,
    options: ClassifyOptions,
) -> Result<RelationshipResult, LineageError> {
    let id_a = graph.require(a)?;
    let id_b = graph.require(b)?;

    if id_a == id_b {
        return Ok(RelationshipResult {
            subject_a: a.clone(),
            subject_b: b.clone(),
            common_ancestor: Some(a.clone()),
            distance_a: Some(0),
            distance_b: Some(0),
            degree: Some(0),
            removal: Some(0),
            kind: RelationshipKind::Same,
        });
    }

    let depth = options.effective_depth();
    let climb_a = climb(graph, id_a, depth);
    let climb_b = climb(graph, id_b, depth);

    let direct = |ancestor: &PersonKey, distance_a: u32, distance_b: u32| RelationshipResult {
        subject_a: a.clone(),
        subject_b: b.clone(),
        common_ancestor: Some(ancestor.clone()),
        distance_a: Some(distance_a),
        distance_b: Some(distance_b),
        degree: Some(distance_a.max(distance_b)),
        removal: Some(0),
        kind: RelationshipKind::Direct,
    };
    if let Some(&up) = climb_a.distances.get(&id_b) {
        return Ok(direct(b, up, 0));
    }
    if let Some(&down) = climb_b.distances.get(&id_a) {
        return Ok(direct(a, 0, down));
    }

    let ranked = ranked_common(&climb_a, &climb_b);
    let Some(&(ancestor, distance_a, distance_b)) = ranked.first() else {
        let kind = if options.distinguish_depth_exceeded
            && (climb_a.truncated || climb_b.truncated)
        {
            RelationshipKind::DepthExceeded
        } else {
            RelationshipKind::Unrelated
        };
        return Ok(RelationshipResult::without_ancestor(a, b, kind));
    };

    let lo = distance_a.min(distance_b);
    let hi = distance_a.max(distance_b);
    Ok(RelationshipResult {
        subject_a: a.clone(),
        subject_b: b.clone(),
        common_ancestor: Some(graph.key_of(ancestor).clone()),
        distance_a: Some(distance_a),
        distance_b: Some(distance_b),
        degree: Some(lo.saturating_sub(1)),
        removal: Some(hi - lo),
        kind: RelationshipKind::Collateral,
    })
}

// =============================================================================
// TESTS
// =============================================================================
