//! # Core Type Definitions
//!
//! This module contains the record and value types shared by every component:
//! - Record identifiers (`PersonKey`, `FamilyKey`, `GraphVersion`) and the
//!   crate-internal arena index `PersonId`
//! - Collaborator-supplied records (`PersonRecord`, `FamilyRecord`, `RecordSet`)
//! - Query vocabulary (`Parents`, `Branch`, `EdgeLabel`)
//! - Error types (`LineageError`, `GraphFault`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they serve as keys in `BTreeMap`/`BTreeSet`
//!
//! Callers address persons by `PersonKey` only; arena ids stay inside the crate:
//!
//! ```compile_fail
//! use lineage_core::types::PersonId;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

/// Unique key of a person, as assigned by the parser/storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonKey(pub String);

impl PersonKey {
    /// Create a new person key.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PersonKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique key of a family (a union plus its children).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyKey(pub String);

impl FamilyKey {
    /// Create a new family key.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FamilyKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FamilyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Dense arena index of a person inside one graph snapshot.
///
/// Ids are assigned in ascending `PersonKey` order, so ordering two ids
/// orders their keys lexicographically. Ids are meaningless across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PersonId(pub(crate) u32);

impl PersonId {
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of one immutable graph snapshot. Bumped on every reload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct GraphVersion(pub u64);

impl GraphVersion {
    /// The version given to the first snapshot an engine loads.
    pub const INITIAL: Self = Self(1);

    /// The version that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for GraphVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =============================================================================
// RECORDS (supplied by the parser/storage collaborator)
// =============================================================================

/// Recorded sex of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

/// A person as handed over by the parser/storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub key: PersonKey,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    /// The family in which this person appears as a child.
    #[serde(default, rename = "familyOfOriginKey")]
    pub family_of_origin: Option<FamilyKey>,
    /// Families in which this person appears as a parent.
    #[serde(default, rename = "unionKeys")]
    pub unions: BTreeSet<FamilyKey>,
}

impl PersonRecord {
    /// Create a person with no recorded parentage, unions, or dates.
    #[must_use]
    pub fn new(key: impl Into<PersonKey>, sex: Sex) -> Self {
        Self {
            key: key.into(),
            sex,
            birth_year: None,
            death_year: None,
            family_of_origin: None,
            unions: BTreeSet::new(),
        }
    }

    /// Set the family of origin.
    #[must_use]
    pub fn child_of(mut self, family: impl Into<FamilyKey>) -> Self {
        self.family_of_origin = Some(family.into());
        self
    }

    /// Add a union in which this person is a parent.
    #[must_use]
    pub fn with_union(mut self, family: impl Into<FamilyKey>) -> Self {
        self.unions.insert(family.into());
        self
    }

    /// Set the birth and death years.
    #[must_use]
    pub fn with_years(mut self, birth: Option<i32>, death: Option<i32>) -> Self {
        self.birth_year = birth;
        self.death_year = death;
        self
    }
}

/// A family as handed over by the parser/storage layer.
///
/// `parent1` occupies the father slot and `parent2` the mother slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRecord {
    pub key: FamilyKey,
    #[serde(default, rename = "parent1Key")]
    pub parent1: Option<PersonKey>,
    #[serde(default, rename = "parent2Key")]
    pub parent2: Option<PersonKey>,
    #[serde(default, rename = "childKeys")]
    pub children: Vec<PersonKey>,
}

impl FamilyRecord {
    /// Create a family with the given parent slots and no children.
    #[must_use]
    pub fn new(
        key: impl Into<FamilyKey>,
        parent1: Option<PersonKey>,
        parent2: Option<PersonKey>,
    ) -> Self {
        Self {
            key: key.into(),
            parent1,
            parent2,
            children: Vec::new(),
        }
    }

    /// Append a child, preserving birth order as given.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<PersonKey>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Iterate over the known parents, father slot first.
    pub fn parents(&self) -> impl Iterator<Item = &PersonKey> {
        self.parent1.iter().chain(self.parent2.iter())
    }
}

/// A complete record set, the unit of loading and reloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecordSet {
    #[serde(default)]
    pub persons: Vec<PersonRecord>,
    #[serde(default)]
    pub families: Vec<FamilyRecord>,
}

impl RecordSet {
    /// Create an empty record set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a person.
    pub fn push_person(&mut self, person: PersonRecord) -> &mut Self {
        self.persons.push(person);
        self
    }

    /// Add a family.
    pub fn push_family(&mut self, family: FamilyRecord) -> &mut Self {
        self.families.push(family);
        self
    }
}

// =============================================================================
// QUERY VOCABULARY
// =============================================================================

/// Direct parents of a person. Either slot may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parents<T> {
    pub father: Option<T>,
    pub mother: Option<T>,
}

impl<T> Parents<T> {
    /// No known parent.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            father: None,
            mother: None,
        }
    }

    /// True when neither parent is known.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.father.is_none() && self.mother.is_none()
    }

    /// Iterate over the known parents, father first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.father.iter().chain(self.mother.iter())
    }

    /// Map both slots.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Parents<U> {
        Parents {
            father: self.father.map(&mut f),
            mother: self.mother.map(&mut f),
        }
    }
}

/// Side of an ancestor slot, read off a Sosa number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Branch {
    /// Sosa number 1.
    Root,
    /// Even numbers: the slot is a father.
    Paternal,
    /// Odd numbers above 1: the slot is a mother.
    Maternal,
}

/// Semantic direction of one step in a relationship path.
///
/// The label describes the person reached by the step relative to the
/// person before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeLabel {
    /// The reached person is a parent of the previous one.
    ParentOf,
    /// The reached person is a child of the previous one.
    ChildOf,
    /// The reached person is a co-parent of the previous one.
    SpouseOf,
}

impl EdgeLabel {
    /// Parent/child edges win ties against spouse edges.
    #[must_use]
    pub const fn is_blood(self) -> bool {
        matches!(self, Self::ParentOf | Self::ChildOf)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// A structural fault found while building a kinship graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphFault {
    #[error("family {family} references unknown person {person}")]
    UnknownPerson { family: FamilyKey, person: PersonKey },

    #[error("person {person} references unknown family {family}")]
    UnknownFamily { person: PersonKey, family: FamilyKey },

    #[error("duplicate person key {0}")]
    DuplicatePerson(PersonKey),

    #[error("duplicate family key {0}")]
    DuplicateFamily(FamilyKey),

    /// A child is claimed by two families, which would give them more than two parents.
    #[error("person {person} is a child of both {first} and {second}")]
    ConflictingParentage {
        person: PersonKey,
        first: FamilyKey,
        second: FamilyKey,
    },

    #[error("person {person} lists union {family} but is not one of its parents")]
    UnionNotParent { person: PersonKey, family: FamilyKey },

    #[error("family {family} names {person} in both parent slots")]
    SameParentTwice { family: FamilyKey, person: PersonKey },

    /// The listed persons form a loop along parent edges.
    #[error("parent cycle through {}", display_cycle(.cycle))]
    ParentCycle { cycle: Vec<PersonKey> },
}

fn display_cycle(cycle: &[PersonKey]) -> String {
    cycle
        .iter()
        .map(PersonKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur in the lineage engine.
///
/// - No silent failures
/// - Use `Result<T, LineageError>` for fallible operations
/// - The core never panics; negative answers (not an ancestor, unrelated,
///   no path) are ordinary values, not errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    /// The query references a key absent from the current snapshot.
    #[error("Unknown person: {0}")]
    UnknownPerson(PersonKey),

    /// The record set failed structural validation; no graph was built.
    #[error("Malformed graph: {0}")]
    MalformedGraph(#[from] GraphFault),

    /// A Sosa number could not be parsed or is zero.
    #[error("Invalid Sosa number: {0}")]
    InvalidSosaNumber(String),

    /// A coefficient could not be parsed as `n` or `n/2^k`.
    #[error("Invalid coefficient: {0}")]
    InvalidCoefficient(String),

    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
