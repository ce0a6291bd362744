//! # lineage-core
//!
//! The deterministic kinship engine for genealogical record sets.
//!
//! This crate answers two questions authoritatively: "what is this person's
//! position in the ancestor tree?" and "how are these two people related?".
//!
//! ## Components
//!
//! - `graph` → immutable, versioned kinship graph (`KinshipStore`)
//! - `sosa` → Sosa-Stradonitz ancestor numbering with a per-version cache
//! - `consanguinity` → closest common ancestor, cousin degree and removal
//! - `kinship` → exact kinship and inbreeding coefficients, ancestral lines
//! - `path` → shortest parent/child/spouse chain between two persons
//! - `engine` → the facade with atomic snapshot reload
//!
//! ## Architectural Constraints
//!
//! - Records arrive already parsed; no file formats, no persistence
//! - BTreeMap/BTreeSet only, no floats, no randomness
//! - NO async, NO network dependencies (pure Rust)
//! - Every search is bounded by `max_depth` or `max_distance`

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod consanguinity;
pub mod describe;
pub mod engine;
pub mod golden;
pub mod graph;
pub mod kinship;
mod limbs;
pub mod path;
pub mod primitives;
pub mod sosa;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Branch, EdgeLabel, FamilyKey, FamilyRecord, GraphFault, GraphVersion, LineageError, Parents,
    PersonKey, PersonRecord, RecordSet, Sex,
};

pub(crate) use types::PersonId;

// =============================================================================
// RE-EXPORTS: Engine Components
// =============================================================================

pub use config::EngineConfig;
pub use consanguinity::{
    AncestorDistances, ClassifyOptions, CommonAncestor, RelationshipKind, RelationshipResult,
};
pub use describe::describe;
pub use engine::{Engine, Snapshot};
pub use golden::{GoldenScenario, ScenarioFile, ScenarioMismatch, check_scenario};
pub use graph::{KinshipGraph, KinshipStore};
pub use kinship::{AncestorLinks, BranchPath, Coefficient, KinshipCache, RelationshipSummary};
pub use path::{PathOutcome, PathStep, RelationshipPath};
pub use sosa::{SosaCache, SosaLookup, SosaNumber, SosaTable};
