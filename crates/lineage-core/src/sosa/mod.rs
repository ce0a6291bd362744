//! # Sosa Numbering Service
//!
//! Sosa-Stradonitz (ahnentafel) numbering relative to a chosen root: the
//! root is 1, the father of n is 2n and the mother of n is 2n + 1.
//!
//! Numbers are computed per root by `SosaCache` and looked up in the
//! resulting `SosaTable`. Incomplete pedigrees simply stop; no placeholder
//! ancestors are ever invented.

mod cache;
mod number;

pub use cache::{SosaCache, SosaTable};
pub use number::SosaNumber;

use crate::graph::KinshipGraph;
use crate::{Branch, LineageError, PersonKey};
use serde::{Deserialize, Serialize};

/// Outcome of a Sosa lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SosaLookup {
    /// The target is in the root's ancestor cone.
    Ancestor(SosaNumber),
    /// The target is known but not an ancestor of the root.
    NotAncestor,
}

impl SosaLookup {
    /// The number, if the target is an ancestor.
    #[must_use]
    pub fn number(&self) -> Option<&SosaNumber> {
        match self {
            Self::Ancestor(number) => Some(number),
            Self::NotAncestor => None,
        }
    }
}

/// Side of the pedigree a number belongs to.
#[must_use]
pub fn branch_of(number: &SosaNumber) -> Branch {
    number.branch()
}

/// Generation of a number, the root being generation 1.
#[must_use]
pub fn generation_of(number: &SosaNumber) -> u32 {
    number.generation()
}

/// Look up `target` in the table of `root`.
pub fn sosa_of(
    cache: &SosaCache,
    root: &PersonKey,
    target: &PersonKey,
) -> Result<SosaLookup, LineageError> {
    let table = cache.table_for(root)?;
    cache.graph().require(target)?;
    if let Some(number) = table.number_of(target) {
        return Ok(SosaLookup::Ancestor(number.clone()));
    }
    Ok(SosaLookup::NotAncestor)
}

/// Persons from the ancestor at `number` down to `root`, following the
/// father and mother slots the number spells.
///
/// Returns `None` when a parent along the way is unknown.
pub fn ancestor_chain(
    graph: &KinshipGraph,
    root: &PersonKey,
    number: &SosaNumber,
) -> Result<Option<Vec<PersonKey>>, LineageError> {
    let mut current = graph.require(root)?;
    let mut chain = vec![current];

    for to_mother in number.steps_from_root() {
        let parents = graph.parent_ids(current);
        let next = if to_mother {
            parents.mother
        } else {
            parents.father
        };
        let Some(next) = next else {
            return Ok(None);
        };
        chain.push(next);
        current = next;
    }

    Ok(Some(
        chain
            .into_iter()
            .rev()
            .map(|id| graph.key_of(id).clone())
            .collect(),
    ))
}

/// The Sosa number denoted by a chain running from an ancestor down to the
/// root (the root last).
///
/// Returns `None` for an empty chain or when some link is not a parent of
/// the next person.
pub fn sosa_of_chain(
    graph: &KinshipGraph,
    chain: &[PersonKey],
) -> Result<Option<SosaNumber>, LineageError> {
    let ids = chain
        .iter()
        .map(|key| graph.require(key))
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Ok(None);
    }

    let mut number = SosaNumber::one();
    for pair in ids.windows(2).rev() {
        let (ancestor, child) = (pair[0], pair[1]);
        let parents = graph.parent_ids(child);
        number = if parents.father == Some(ancestor) {
            number.father()
        } else if parents.mother == Some(ancestor) {
            number.mother()
        } else {
            return Ok(None);
        };
    }
    Ok(Some(number))
}
