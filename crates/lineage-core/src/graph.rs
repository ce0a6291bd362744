//! # Kinship Graph Store
//!
//! The immutable, versioned kinship graph.
//!
//! A `KinshipGraph` is built once from a complete `RecordSet` and never
//! mutated afterwards. Persons live in an arena indexed by `PersonId`, ids
//! being handed out in ascending key order. Family records mediate every
//! parent/child edge, so remarriage and half-siblings need no special casing.
//!
//! Construction validates the whole record set first: a dangling reference,
//! a child claimed by two families, or a loop along parent edges rejects the
//! set with `LineageError::MalformedGraph`. No partial graph is ever returned.

use crate::{
    FamilyKey, FamilyRecord, GraphFault, GraphVersion, LineageError, Parents, PersonId, PersonKey,
    PersonRecord, RecordSet,
};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// KINSHIPSTORE TRAIT
// =============================================================================

/// Read contract of the kinship graph.
///
/// Every lookup on an absent key fails with `LineageError::UnknownPerson`.
/// Implementors are immutable, so readers never block each other.
pub trait KinshipStore {
    /// Check whether a person exists.
    fn exists(&self, key: &PersonKey) -> bool;

    /// Get the direct parents of a person (father slot, mother slot).
    fn parents_of(&self, key: &PersonKey) -> Result<Parents<PersonKey>, LineageError>;

    /// Get the children of a person across all their unions.
    fn children_of(&self, key: &PersonKey) -> Result<BTreeSet<PersonKey>, LineageError>;

    /// Get every co-parent of a person across all their unions.
    fn spouses_of(&self, key: &PersonKey) -> Result<BTreeSet<PersonKey>, LineageError>;
}

// =============================================================================
// ARENA NODES
// =============================================================================

#[derive(Debug, Clone)]
struct PersonNode {
    record: PersonRecord,
    parents: Parents<PersonId>,
    origin: Option<usize>,
    unions: Vec<usize>,
    children: Vec<PersonId>,
    spouses: Vec<PersonId>,
}

#[derive(Debug, Clone)]
struct FamilyNode {
    record: FamilyRecord,
    parent1: Option<PersonId>,
    parent2: Option<PersonId>,
    children: Vec<PersonId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The kinship graph of one record-set version.
///
/// Uses `BTreeMap` indexes exclusively for deterministic ordering.
#[derive(Debug, Clone)]
pub struct KinshipGraph {
    version: GraphVersion,
    persons: Vec<PersonNode>,
    families: Vec<FamilyNode>,
    person_index: BTreeMap<PersonKey, PersonId>,
    family_index: BTreeMap<FamilyKey, usize>,
    /// Longest parent chain above each person; founders are 0.
    depths: Vec<u32>,
}

impl KinshipGraph {
    /// Build and validate a graph from a complete record set.
    ///
    /// Runs in O(persons + families) plus the cost of sorting keys.
    pub fn build(records: RecordSet, version: GraphVersion) -> Result<Self, LineageError> {
        let mut person_records = BTreeMap::new();
        for person in records.persons {
            let key = person.key.clone();
            if person_records.insert(key.clone(), person).is_some() {
                return Err(GraphFault::DuplicatePerson(key).into());
            }
        }

        let mut family_records = BTreeMap::new();
        for family in records.families {
            let key = family.key.clone();
            if family_records.insert(key.clone(), family).is_some() {
                return Err(GraphFault::DuplicateFamily(key).into());
            }
        }

        let person_index: BTreeMap<PersonKey, PersonId> = person_records
            .keys()
            .enumerate()
            .map(|(i, key)| (key.clone(), PersonId(i as u32)))
            .collect();
        let family_index: BTreeMap<FamilyKey, usize> = family_records
            .keys()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();

        let mut persons: Vec<PersonNode> = person_records
            .into_values()
            .map(|record| PersonNode {
                record,
                parents: Parents::none(),
                origin: None,
                unions: Vec::new(),
                children: Vec::new(),
                spouses: Vec::new(),
            })
            .collect();

        let mut families = Vec::with_capacity(family_records.len());
        for record in family_records.into_values() {
            let resolve = |slot: &Option<PersonKey>| -> Result<Option<PersonId>, LineageError> {
                match slot {
                    None => Ok(None),
                    Some(key) => person_index.get(key).copied().map(Some).ok_or_else(|| {
                        GraphFault::UnknownPerson {
                            family: record.key.clone(),
                            person: key.clone(),
                        }
                        .into()
                    }),
                }
            };
            let parent1 = resolve(&record.parent1)?;
            let parent2 = resolve(&record.parent2)?;
            if let (Some(p1), Some(p2)) = (parent1, parent2) {
                if p1 == p2 {
                    return Err(GraphFault::SameParentTwice {
                        family: record.key.clone(),
                        person: persons[p1.index()].record.key.clone(),
                    }
                    .into());
                }
            }

            let mut children = Vec::with_capacity(record.children.len());
            for child in &record.children {
                let id = person_index.get(child).copied().ok_or_else(|| {
                    LineageError::from(GraphFault::UnknownPerson {
                        family: record.key.clone(),
                        person: child.clone(),
                    })
                })?;
                if !children.contains(&id) {
                    children.push(id);
                }
            }

            families.push(FamilyNode {
                record,
                parent1,
                parent2,
                children,
            });
        }

        // Family of origin: the person's own claim first, then the family lists.
        for person in &mut persons {
            if let Some(family_key) = &person.record.family_of_origin {
                let family = family_index.get(family_key).copied().ok_or_else(|| {
                    LineageError::from(GraphFault::UnknownFamily {
                        person: person.record.key.clone(),
                        family: family_key.clone(),
                    })
                })?;
                person.origin = Some(family);
            }
        }
        for (family_id, family) in families.iter().enumerate() {
            for child in &family.children {
                let node = &mut persons[child.index()];
                match node.origin {
                    None => node.origin = Some(family_id),
                    Some(existing) if existing == family_id => {}
                    Some(existing) => {
                        return Err(GraphFault::ConflictingParentage {
                            person: node.record.key.clone(),
                            first: families[existing].record.key.clone(),
                            second: family.record.key.clone(),
                        }
                        .into());
                    }
                }
            }
        }

        // Children claiming a family the family itself does not list are appended
        // after the listed ones, in key order.
        for (i, person) in persons.iter().enumerate() {
            if let Some(family_id) = person.origin {
                let id = PersonId(i as u32);
                let family = &mut families[family_id];
                if !family.children.contains(&id) {
                    family.children.push(id);
                }
            }
        }

        // Unions must name families where the person really is a parent.
        for person in &persons {
            for family_key in &person.record.unions {
                let family_id = family_index.get(family_key).copied().ok_or_else(|| {
                    LineageError::from(GraphFault::UnknownFamily {
                        person: person.record.key.clone(),
                        family: family_key.clone(),
                    })
                })?;
                let family = &families[family_id];
                let id = person_index.get(&person.record.key).copied();
                if family.parent1 != id && family.parent2 != id {
                    return Err(GraphFault::UnionNotParent {
                        person: person.record.key.clone(),
                        family: family_key.clone(),
                    }
                    .into());
                }
            }
        }

        for (family_id, family) in families.iter().enumerate() {
            for parent in [family.parent1, family.parent2].into_iter().flatten() {
                persons[parent.index()].unions.push(family_id);
            }
            if let (Some(p1), Some(p2)) = (family.parent1, family.parent2) {
                persons[p1.index()].spouses.push(p2);
                persons[p2.index()].spouses.push(p1);
            }
        }

        for i in 0..persons.len() {
            let Some(family_id) = persons[i].origin else {
                continue;
            };
            let parents = Parents {
                father: families[family_id].parent1,
                mother: families[family_id].parent2,
            };
            let id = PersonId(i as u32);
            for parent in parents.iter() {
                persons[parent.index()].children.push(id);
            }
            persons[i].parents = parents;
        }

        for person in &mut persons {
            person.spouses.sort_unstable();
            person.spouses.dedup();
            person.children.sort_unstable();
            person.children.dedup();
        }

        let mut graph = Self {
            version,
            persons,
            families,
            person_index,
            family_index,
            depths: Vec::new(),
        };
        graph.depths = graph.check_acyclic()?;

        tracing::debug!(
            version = %graph.version,
            persons = graph.persons.len(),
            families = graph.families.len(),
            "kinship graph built"
        );

        Ok(graph)
    }

    /// Reject any loop along parent edges and measure each person's depth.
    ///
    /// Iterative DFS with a white/grey/black color map; a grey node reached
    /// again is on the current path, hence its own ancestor. A node turns
    /// black only after both parents have, so its depth is final then.
    fn check_acyclic(&self) -> Result<Vec<u32>, LineageError> {
        let mut color = vec![Color::White; self.persons.len()];
        let mut depths = vec![0u32; self.persons.len()];

        for start in 0..self.persons.len() {
            if color[start] != Color::White {
                continue;
            }
            color[start] = Color::Grey;
            let mut stack: Vec<(PersonId, usize)> = vec![(PersonId(start as u32), 0)];

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                let slots = self.parent_slots(node);
                if cursor >= slots.len() {
                    color[node.index()] = Color::Black;
                    let depth = slots
                        .iter()
                        .flatten()
                        .map(|parent| depths[parent.index()] + 1)
                        .max()
                        .unwrap_or(0);
                    depths[node.index()] = depth;
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let Some(parent) = slots[cursor] else {
                    continue;
                };
                match color[parent.index()] {
                    Color::White => {
                        color[parent.index()] = Color::Grey;
                        stack.push((parent, 0));
                    }
                    Color::Grey => {
                        let from = stack
                            .iter()
                            .position(|(id, _)| *id == parent)
                            .unwrap_or(0);
                        let cycle = stack[from..]
                            .iter()
                            .map(|(id, _)| self.key_of(*id).clone())
                            .chain(std::iter::once(self.key_of(parent).clone()))
                            .collect();
                        tracing::warn!(version = %self.version, "parent cycle rejected");
                        return Err(GraphFault::ParentCycle { cycle }.into());
                    }
                    Color::Black => {}
                }
            }
        }

        Ok(depths)
    }

    fn parent_slots(&self, id: PersonId) -> [Option<PersonId>; 2] {
        let parents = self.persons[id.index()].parents;
        [parents.father, parents.mother]
    }

    // =========================================================================
    // INTERNAL ID API (used by the traversal modules)
    // =========================================================================

    /// Resolve a key to its arena id, or fail with `UnknownPerson`.
    pub(crate) fn require(&self, key: &PersonKey) -> Result<PersonId, LineageError> {
        self.person_index
            .get(key)
            .copied()
            .ok_or_else(|| LineageError::UnknownPerson(key.clone()))
    }

    pub(crate) fn key_of(&self, id: PersonId) -> &PersonKey {
        &self.persons[id.index()].record.key
    }

    pub(crate) fn parent_ids(&self, id: PersonId) -> Parents<PersonId> {
        self.persons[id.index()].parents
    }

    pub(crate) fn child_ids(&self, id: PersonId) -> &[PersonId] {
        &self.persons[id.index()].children
    }

    pub(crate) fn spouse_ids(&self, id: PersonId) -> &[PersonId] {
        &self.persons[id.index()].spouses
    }

    /// Length of the longest parent chain above `id`. An ancestor is always
    /// strictly shallower than its descendants.
    pub(crate) fn depth_of(&self, id: PersonId) -> u32 {
        self.depths[id.index()]
    }

    // =========================================================================
    // PUBLIC READ API
    // =========================================================================

    /// The version this graph was built as.
    #[must_use]
    pub fn version(&self) -> GraphVersion {
        self.version
    }

    /// Number of persons.
    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    /// Number of families.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// All person keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &PersonKey> {
        self.person_index.keys()
    }

    /// All person records in ascending key order.
    pub fn persons(&self) -> impl Iterator<Item = &PersonRecord> {
        self.persons.iter().map(|node| &node.record)
    }

    /// Look up a person record.
    #[must_use]
    pub fn person(&self, key: &PersonKey) -> Option<&PersonRecord> {
        let id = self.person_index.get(key)?;
        Some(&self.persons[id.index()].record)
    }

    /// Look up a family record.
    #[must_use]
    pub fn family(&self, key: &FamilyKey) -> Option<&FamilyRecord> {
        let id = self.family_index.get(key)?;
        Some(&self.families[*id].record)
    }

    /// The family in which a person appears as a child, if any.
    pub fn family_of_origin(&self, key: &PersonKey) -> Result<Option<&FamilyKey>, LineageError> {
        let id = self.require(key)?;
        Ok(self.persons[id.index()]
            .origin
            .map(|family| &self.families[family].record.key))
    }

    /// The families in which a person appears as a parent, in key order.
    pub fn unions_of(&self, key: &PersonKey) -> Result<Vec<&FamilyKey>, LineageError> {
        let id = self.require(key)?;
        Ok(self.persons[id.index()]
            .unions
            .iter()
            .map(|family| &self.families[*family].record.key)
            .collect())
    }

    /// Export the normalized record set this graph was built from.
    ///
    /// Derived links (a child adopted by the family that lists it, unions
    /// implied by parent slots) are written back explicitly, so rebuilding
    /// from the export yields an identical graph.
    #[must_use]
    pub fn to_records(&self) -> RecordSet {
        let persons = self
            .persons
            .iter()
            .map(|node| {
                let mut record = node.record.clone();
                record.family_of_origin = node
                    .origin
                    .map(|family| self.families[family].record.key.clone());
                record.unions = node
                    .unions
                    .iter()
                    .map(|family| self.families[*family].record.key.clone())
                    .collect();
                record
            })
            .collect();
        let families = self
            .families
            .iter()
            .map(|node| FamilyRecord {
                children: node
                    .children
                    .iter()
                    .map(|id| self.key_of(*id).clone())
                    .collect(),
                ..node.record.clone()
            })
            .collect();
        RecordSet { persons, families }
    }

    fn keys_of(&self, ids: &[PersonId]) -> BTreeSet<PersonKey> {
        ids.iter().map(|id| self.key_of(*id).clone()).collect()
    }
}

impl KinshipStore for KinshipGraph {
    fn exists(&self, key: &PersonKey) -> bool {
        self.person_index.contains_key(key)
    }

    fn parents_of(&self, key: &PersonKey) -> Result<Parents<PersonKey>, LineageError> {
        let id = self.require(key)?;
        Ok(self.parent_ids(id).map(|parent| self.key_of(parent).clone()))
    }

    fn children_of(&self, key: &PersonKey) -> Result<BTreeSet<PersonKey>, LineageError> {
        let id = self.require(key)?;
        Ok(self.keys_of(self.child_ids(id)))
    }

    fn spouses_of(&self, key: &PersonKey) -> Result<BTreeSet<PersonKey>, LineageError> {
        let id = self.require(key)?;
        Ok(self.keys_of(self.spouse_ids(id)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
