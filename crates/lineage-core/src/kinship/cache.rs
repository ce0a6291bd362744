//! Memoized kinship coefficients for one graph snapshot.

use super::Coefficient;
use crate::graph::KinshipGraph;
use crate::{GraphVersion, LineageError, PersonId, PersonKey};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// An unordered pair, smaller id first.
type Pair = (PersonId, PersonId);

fn pair(a: PersonId, b: PersonId) -> Pair {
    if a <= b { (a, b) } else { (b, a) }
}

/// The pairs whose coefficients `target` is derived from.
///
/// For a person with itself that is the parent couple. For two distinct
/// persons the deeper one (larger depth, then larger id) is replaced by each
/// of its parents; the deeper one is never an ancestor of the other, which
/// is what makes the recurrence valid.
fn dependencies(graph: &KinshipGraph, (x, y): Pair) -> Vec<Pair> {
    if x == y {
        let parents = graph.parent_ids(x);
        return match (parents.father, parents.mother) {
            (Some(father), Some(mother)) => vec![pair(father, mother)],
            _ => Vec::new(),
        };
    }
    let (deeper, other) = if (graph.depth_of(x), x) >= (graph.depth_of(y), y) {
        (x, y)
    } else {
        (y, x)
    };
    graph
        .parent_ids(deeper)
        .iter()
        .map(|parent| pair(*parent, other))
        .collect()
}

/// phi(x, x) = (1 + phi(father, mother)) / 2
/// phi(x, y) = (phi(px1, y) + phi(px2, y)) / 2, a missing parent adding 0
fn combine<'a>((x, y): Pair, parts: impl Iterator<Item = &'a Coefficient>) -> Coefficient {
    let sum = parts.fold(Coefficient::zero(), |acc, part| acc.plus(part));
    if x == y {
        Coefficient::one().plus(&sum).half()
    } else {
        sum.half()
    }
}

/// Kinship coefficients of one snapshot, computed on demand and kept.
///
/// Evaluation walks an explicit stack, so deep pedigrees cannot overflow the
/// call stack. The memo lock is held for a whole evaluation.
#[derive(Debug)]
pub struct KinshipCache {
    graph: Arc<KinshipGraph>,
    memo: Mutex<BTreeMap<Pair, Coefficient>>,
}

impl KinshipCache {
    /// Create an empty cache over one graph snapshot.
    #[must_use]
    pub fn new(graph: Arc<KinshipGraph>) -> Self {
        Self {
            graph,
            memo: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) fn graph(&self) -> &KinshipGraph {
        &self.graph
    }

    /// The version every coefficient in this cache belongs to.
    #[must_use]
    pub fn version(&self) -> GraphVersion {
        self.graph.version()
    }

    /// Probability that alleles drawn at random from `a` and `b` are
    /// identical by descent.
    pub fn kinship(&self, a: &PersonKey, b: &PersonKey) -> Result<Coefficient, LineageError> {
        let a = self.graph.require(a)?;
        let b = self.graph.require(b)?;
        Ok(self.kinship_of(a, b))
    }

    /// Inbreeding coefficient of `person`: the kinship of its parents, or 0
    /// when either parent is unknown.
    pub fn inbreeding(&self, person: &PersonKey) -> Result<Coefficient, LineageError> {
        let id = self.graph.require(person)?;
        Ok(self.inbreeding_of(id))
    }

    /// Number of pairs evaluated so far.
    #[must_use]
    pub fn memoized_pairs(&self) -> usize {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Forget every memoized pair.
    pub fn clear(&self) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn inbreeding_of(&self, id: PersonId) -> Coefficient {
        let parents = self.graph.parent_ids(id);
        match (parents.father, parents.mother) {
            (Some(father), Some(mother)) => self.kinship_of(father, mother),
            _ => Coefficient::zero(),
        }
    }

    pub(crate) fn kinship_of(&self, a: PersonId, b: PersonId) -> Coefficient {
        let target = pair(a, b);
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stack = vec![target];

        while let Some(&current) = stack.last() {
            if memo.contains_key(&current) {
                stack.pop();
                continue;
            }
            let parts = dependencies(&self.graph, current);
            let missing: Vec<Pair> = parts
                .iter()
                .copied()
                .filter(|part| !memo.contains_key(part))
                .collect();
            if !missing.is_empty() {
                stack.extend(missing);
                continue;
            }
            let value = combine(current, parts.iter().filter_map(|part| memo.get(part)));
            memo.insert(current, value);
            stack.pop();
        }

        memo.get(&target).cloned().unwrap_or_default()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FamilyRecord, PersonRecord, RecordSet, Sex};

    fn key(s: &str) -> PersonKey {
        PersonKey::new(s)
    }

    fn c(text: &str) -> Coefficient {
        text.parse().expect("coefficient")
    }

    /// gp + gm -> (p1, p2); p1 + s1 -> c1; s2 + p2 -> c2; c1 + c2 -> k.
    /// k is the child of first cousins.
    fn cousin_marriage() -> KinshipCache {
        let mut records = RecordSet::new();
        for (name, sex) in [
            ("gp", Sex::Male),
            ("gm", Sex::Female),
            ("p1", Sex::Male),
            ("p2", Sex::Female),
            ("s1", Sex::Female),
            ("s2", Sex::Male),
            ("c1", Sex::Male),
            ("c2", Sex::Female),
            ("k", Sex::Unknown),
            ("sib", Sex::Unknown),
        ] {
            records.push_person(PersonRecord::new(name, sex));
        }
        records
            .push_family(
                FamilyRecord::new("f0", Some(key("gp")), Some(key("gm")))
                    .with_child("p1")
                    .with_child("p2"),
            )
            .push_family(FamilyRecord::new("f1", Some(key("p1")), Some(key("s1"))).with_child("c1"))
            .push_family(FamilyRecord::new("f2", Some(key("s2")), Some(key("p2"))).with_child("c2"))
            .push_family(
                FamilyRecord::new("f3", Some(key("c1")), Some(key("c2")))
                    .with_child("k")
                    .with_child("sib"),
            );
        let graph = KinshipGraph::build(records, GraphVersion::INITIAL).expect("build");
        KinshipCache::new(Arc::new(graph))
    }

    fn kinship(cache: &KinshipCache, a: &str, b: &str) -> Coefficient {
        cache.kinship(&key(a), &key(b)).expect("kinship")
    }

    #[test]
    fn classical_kinship_values() {
        let cache = cousin_marriage();
        assert_eq!(kinship(&cache, "p1", "p2"), c("1/4"));
        assert_eq!(kinship(&cache, "gp", "p1"), c("1/4"));
        assert_eq!(kinship(&cache, "gp", "c1"), c("1/8"));
        assert_eq!(kinship(&cache, "c1", "c2"), c("1/16"));
        assert_eq!(kinship(&cache, "gp", "gm"), Coefficient::zero());
        assert_eq!(kinship(&cache, "s1", "c2"), Coefficient::zero());
    }

    #[test]
    fn self_kinship_carries_inbreeding() {
        let cache = cousin_marriage();
        assert_eq!(kinship(&cache, "gp", "gp"), c("1/2"));
        // (1 + 1/16) / 2
        assert_eq!(kinship(&cache, "k", "k"), c("17/32"));
    }

    #[test]
    fn child_of_first_cousins_is_inbred() {
        let cache = cousin_marriage();
        assert_eq!(cache.inbreeding(&key("k")).expect("f"), c("1/16"));
        assert_eq!(cache.inbreeding(&key("c1")).expect("f"), Coefficient::zero());
        assert_eq!(cache.inbreeding(&key("gp")).expect("f"), Coefficient::zero());
    }

    #[test]
    fn inbred_full_siblings() {
        let cache = cousin_marriage();
        // (1/4)(phi(c1, c1) + phi(c2, c2) + 2 phi(c1, c2)) = (1/4)(1/2 + 1/2 + 1/8)
        assert_eq!(kinship(&cache, "k", "sib"), c("9/32"));
    }

    #[test]
    fn symmetric_and_memoized() {
        let cache = cousin_marriage();
        assert_eq!(kinship(&cache, "c2", "gp"), kinship(&cache, "gp", "c2"));
        let after_first = cache.memoized_pairs();
        assert!(after_first > 0);
        kinship(&cache, "gp", "c2");
        assert_eq!(cache.memoized_pairs(), after_first);

        cache.clear();
        assert_eq!(cache.memoized_pairs(), 0);
    }

    #[test]
    fn unknown_person_is_an_error() {
        let cache = cousin_marriage();
        assert_eq!(
            cache.kinship(&key("ghost"), &key("k")),
            Err(LineageError::UnknownPerson(key("ghost")))
        );
        assert!(cache.inbreeding(&key("ghost")).is_err());
    }

    #[test]
    fn deep_line_does_not_recurse() {
        let mut records = RecordSet::new();
        records.push_person(PersonRecord::new("n0000", Sex::Unknown));
        for i in 1..3000 {
            records
                .push_person(PersonRecord::new(format!("n{i:04}"), Sex::Unknown))
                .push_family(
                    FamilyRecord::new(format!("f{i:04}"), Some(key(&format!("n{:04}", i - 1))), None)
                        .with_child(format!("n{i:04}")),
                );
        }
        let graph = KinshipGraph::build(records, GraphVersion::INITIAL).expect("build");
        let cache = KinshipCache::new(Arc::new(graph));

        let far = cache.kinship(&key("n0000"), &key("n2999")).expect("kinship");
        assert_eq!(far, Coefficient::power_of_half(3000));
    }
}
