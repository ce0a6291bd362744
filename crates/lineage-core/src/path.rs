//! # Relationship Path Finder
//!
//! Shortest chain of parent, child, and spouse edges between two persons.
//!
//! Breadth-first over the undirected union of all three edge kinds, bounded
//! by `max_distance`. Neighbors are expanded blood edges first (parents and
//! children together, in key order), spouses after them (in key order). With
//! a FIFO frontier, the first discovery of each person is therefore the
//! preferred shortest route to it.

use crate::graph::KinshipGraph;
use crate::primitives::MAX_PATH_DISTANCE;
use crate::{EdgeLabel, LineageError, PersonId, PersonKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// One step of a path: the person reached and how they relate to the
/// person before them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub person: PersonKey,
    pub edge: EdgeLabel,
}

/// A relationship chain starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPath {
    pub start: PersonKey,
    pub steps: Vec<PathStep>,
}

impl RelationshipPath {
    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for the path from a person to themself.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The last person of the chain.
    #[must_use]
    pub fn end(&self) -> &PersonKey {
        self.steps.last().map_or(&self.start, |step| &step.person)
    }

    /// Every person along the chain, start included.
    pub fn persons(&self) -> impl Iterator<Item = &PersonKey> {
        std::iter::once(&self.start).chain(self.steps.iter().map(|step| &step.person))
    }

    /// The edge labels in order.
    pub fn labels(&self) -> impl Iterator<Item = EdgeLabel> + '_ {
        self.steps.iter().map(|step| step.edge)
    }
}

/// Result of a path search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathOutcome {
    Found(RelationshipPath),
    /// The whole connected component was searched.
    NotFound,
    /// The search stopped at `max_distance` with persons still unexplored.
    DistanceExceeded,
}

impl PathOutcome {
    /// The path, if one was found.
    #[must_use]
    pub fn path(&self) -> Option<&RelationshipPath> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound | Self::DistanceExceeded => None,
        }
    }
}

fn neighbors(graph: &KinshipGraph, id: PersonId) -> Vec<(PersonId, EdgeLabel)> {
    let mut out: Vec<(PersonId, EdgeLabel)> = graph
        .parent_ids(id)
        .iter()
        .map(|parent| (*parent, EdgeLabel::ParentOf))
        .chain(
            graph
                .child_ids(id)
                .iter()
                .map(|child| (*child, EdgeLabel::ChildOf)),
        )
        .collect();
    out.sort_by_key(|(other, _)| *other);
    out.extend(
        graph
            .spouse_ids(id)
            .iter()
            .map(|spouse| (*spouse, EdgeLabel::SpouseOf)),
    );
    out
}

/// Find the preferred shortest path from `a` to `b`.
pub fn shortest_path(
    graph: &KinshipGraph,
    a: &PersonKey,
    b: &PersonKey,
    max_distance: u32,
) -> Result<PathOutcome, LineageError> {
    let start = graph.require(a)?;
    let target = graph.require(b)?;
    let max_distance = max_distance.min(MAX_PATH_DISTANCE);

    if start == target {
        return Ok(PathOutcome::Found(RelationshipPath {
            start: a.clone(),
            steps: Vec::new(),
        }));
    }

    // Reached person -> (previous person, label of the reached person).
    let mut came_from: BTreeMap<PersonId, Option<(PersonId, EdgeLabel)>> =
        BTreeMap::from([(start, None)]);
    let mut frontier = vec![start];
    let mut distance = 0u32;

    while !frontier.is_empty() {
        if distance == max_distance {
            let unexplored = frontier.iter().any(|id| {
                neighbors(graph, *id)
                    .iter()
                    .any(|(other, _)| !came_from.contains_key(other))
            });
            return Ok(if unexplored {
                PathOutcome::DistanceExceeded
            } else {
                PathOutcome::NotFound
            });
        }
        distance += 1;

        let mut next = Vec::new();
        for current in frontier {
            for (other, edge) in neighbors(graph, current) {
                let Entry::Vacant(slot) = came_from.entry(other) else {
                    continue;
                };
                slot.insert(Some((current, edge)));
                if other == target {
                    return Ok(PathOutcome::Found(rebuild(graph, &came_from, a, target)));
                }
                next.push(other);
            }
        }
        frontier = next;
    }

    Ok(PathOutcome::NotFound)
}

fn rebuild(
    graph: &KinshipGraph,
    came_from: &BTreeMap<PersonId, Option<(PersonId, EdgeLabel)>>,
    start: &PersonKey,
    target: PersonId,
) -> RelationshipPath {
    let mut steps = Vec::new();
    let mut cursor = target;
    while let Some(Some((previous, edge))) = came_from.get(&cursor) {
        steps.push(PathStep {
            person: graph.key_of(cursor).clone(),
            edge: *edge,
        });
        cursor = *previous;
    }
    steps.reverse();
    RelationshipPath {
        start: start.clone(),
        steps,
    }
}
