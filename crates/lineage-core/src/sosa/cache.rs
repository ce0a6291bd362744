//! Per-root Sosa tables and the version-scoped cache that memoizes them.

use super::SosaNumber;
use crate::graph::KinshipGraph;
use crate::{GraphVersion, LineageError, PersonId, PersonKey};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::Bound;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

// =============================================================================
// SOSA TABLE
// =============================================================================

/// The complete ancestor numbering of one root in one graph version.
///
/// Read-only once built. When an ancestor is reachable through several lines
/// (pedigree collapse) it keeps the smallest of its numbers.
#[derive(Debug, Clone)]
pub struct SosaTable {
    version: GraphVersion,
    root: PersonKey,
    by_person: BTreeMap<PersonKey, SosaNumber>,
    by_number: BTreeMap<SosaNumber, PersonKey>,
    collapsed: usize,
}

impl SosaTable {
    /// Enumerate the ancestor cone of `root` breadth-first.
    ///
    /// The queue holds numbers in ascending order (children of n are 2n and
    /// 2n+1), so the first number reaching an ancestor is its smallest one.
    /// Missing parents simply end their branch.
    pub(crate) fn enumerate(graph: &KinshipGraph, root: PersonId) -> Self {
        let mut numbers: BTreeMap<PersonId, SosaNumber> = BTreeMap::new();
        let mut collapsed: BTreeSet<PersonId> = BTreeSet::new();
        let mut queue = VecDeque::from([(root, SosaNumber::one())]);

        while let Some((person, number)) = queue.pop_front() {
            if numbers.contains_key(&person) {
                collapsed.insert(person);
                continue;
            }
            let parents = graph.parent_ids(person);
            if let Some(father) = parents.father {
                queue.push_back((father, number.father()));
            }
            if let Some(mother) = parents.mother {
                queue.push_back((mother, number.mother()));
            }
            numbers.insert(person, number);
        }

        let mut by_person = BTreeMap::new();
        let mut by_number = BTreeMap::new();
        for (person, number) in numbers {
            let key = graph.key_of(person).clone();
            by_number.insert(number.clone(), key.clone());
            by_person.insert(key, number);
        }

        Self {
            version: graph.version(),
            root: graph.key_of(root).clone(),
            by_person,
            by_number,
            collapsed: collapsed.len(),
        }
    }

    /// The graph version this table was computed against.
    #[must_use]
    pub fn version(&self) -> GraphVersion {
        self.version
    }

    /// The person numbered 1.
    #[must_use]
    pub fn root(&self) -> &PersonKey {
        &self.root
    }

    /// Number of known ancestors, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_person.len()
    }

    /// Never true: a table always holds its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_person.is_empty()
    }

    /// Number of ancestors reached through more than one line.
    #[must_use]
    pub fn collapsed_count(&self) -> usize {
        self.collapsed
    }

    /// The Sosa number of a person, if they are in the root's ancestor cone.
    #[must_use]
    pub fn number_of(&self, person: &PersonKey) -> Option<&SosaNumber> {
        self.by_person.get(person)
    }

    /// The person holding a given number, if that slot is known.
    #[must_use]
    pub fn person_at(&self, number: &SosaNumber) -> Option<&PersonKey> {
        self.by_number.get(number)
    }

    /// The next known slot above `number`.
    #[must_use]
    pub fn next_after(&self, number: &SosaNumber) -> Option<(&SosaNumber, &PersonKey)> {
        self.by_number
            .range((Bound::Excluded(number), Bound::Unbounded))
            .next()
    }

    /// The previous known slot below `number`.
    #[must_use]
    pub fn previous_before(&self, number: &SosaNumber) -> Option<(&SosaNumber, &PersonKey)> {
        self.by_number.range(..number).next_back()
    }

    /// All known slots in ascending numeric order.
    pub fn iter(&self) -> impl Iterator<Item = (&SosaNumber, &PersonKey)> {
        self.by_number.iter()
    }

    /// Deepest generation with a known ancestor.
    #[must_use]
    pub fn max_generation(&self) -> u32 {
        self.by_number
            .keys()
            .next_back()
            .map_or(0, SosaNumber::generation)
    }
}

// =============================================================================
// SOSA CACHE
// =============================================================================

type TableCell = Arc<OnceLock<Arc<SosaTable>>>;

/// Lazily built Sosa tables for one graph version.
///
/// `table_for` is the single compute-or-fetch entry point. The mutex only
/// guards the map of per-root cells; the enumeration itself runs inside the
/// cell's `OnceLock`, so concurrent first queries for the same root compute
/// it once and every caller receives the same published table.
#[derive(Debug)]
pub struct SosaCache {
    graph: Arc<KinshipGraph>,
    cells: Mutex<BTreeMap<PersonId, TableCell>>,
}

impl SosaCache {
    /// Create an empty cache over one graph snapshot.
    #[must_use]
    pub fn new(graph: Arc<KinshipGraph>) -> Self {
        Self {
            graph,
            cells: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) fn graph(&self) -> &KinshipGraph {
        &self.graph
    }

    /// The version every table in this cache belongs to.
    #[must_use]
    pub fn version(&self) -> GraphVersion {
        self.graph.version()
    }

    /// Fetch the table for `root`, building it on first use.
    pub fn table_for(&self, root: &PersonKey) -> Result<Arc<SosaTable>, LineageError> {
        let root_id = self.graph.require(root)?;
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cells.entry(root_id).or_default())
        };

        let table = cell.get_or_init(|| {
            let table = SosaTable::enumerate(&self.graph, root_id);
            tracing::debug!(
                version = %table.version(),
                root = %table.root(),
                ancestors = table.len(),
                collapsed = table.collapsed_count(),
                "sosa table built"
            );
            Arc::new(table)
        });
        Ok(Arc::clone(table))
    }

    /// Roots whose tables have been published, in key order.
    #[must_use]
    pub fn cached_roots(&self) -> Vec<PersonKey> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells
            .iter()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(id, _)| self.graph.key_of(*id).clone())
            .collect()
    }

    /// Drop every table. Callers already holding a table keep it.
    pub fn clear(&self) {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
