//! Golden scenario fixtures.
//!
//! A scenario file bundles a record set with expected classifications. The
//! JSON field names follow the fixture schema (`personA`, `personB`,
//! `ancestorPathLengths`, `expectedDegree`, `expectedRemoval`,
//! `expectedDescription`).

use crate::consanguinity::RelationshipKind;
use crate::engine::Snapshot;
use crate::{PersonKey, RecordSet, describe};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One expected classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldenScenario {
    /// Optional label shown in failure reports.
    #[serde(default)]
    pub name: Option<String>,
    pub person_a: PersonKey,
    pub person_b: PersonKey,
    /// `[distance_a, distance_b]`; absent when no common ancestor is expected.
    #[serde(default)]
    pub ancestor_path_lengths: Option<[u32; 2]>,
    #[serde(default)]
    pub expected_degree: Option<u32>,
    #[serde(default)]
    pub expected_removal: Option<u32>,
    pub expected_description: String,
    #[serde(default)]
    pub expected_kind: Option<RelationshipKind>,
}

impl GoldenScenario {
    fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} / {}", self.person_a, self.person_b),
        }
    }
}

/// A record set and the scenarios expected to hold on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub records: RecordSet,
    pub scenarios: Vec<GoldenScenario>,
}

/// Every field of a scenario that disagreed with the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scenario {scenario}: {}", .problems.join("; "))]
pub struct ScenarioMismatch {
    pub scenario: String,
    pub problems: Vec<String>,
}

fn compare<T: PartialEq + std::fmt::Debug>(
    problems: &mut Vec<String>,
    field: &str,
    expected: T,
    actual: T,
) {
    if expected != actual {
        problems.push(format!("{field}: expected {expected:?}, got {actual:?}"));
    }
}

/// Classify the scenario's pair on `snapshot` and compare every field.
pub fn check_scenario(snapshot: &Snapshot, scenario: &GoldenScenario) -> Result<(), ScenarioMismatch> {
    let result = snapshot
        .classify(&scenario.person_a, &scenario.person_b)
        .map_err(|e| ScenarioMismatch {
            scenario: scenario.label(),
            problems: vec![e.to_string()],
        })?;

    let mut problems = Vec::new();
    let distances = result.distance_a.zip(result.distance_b).map(|(a, b)| [a, b]);
    compare(
        &mut problems,
        "ancestorPathLengths",
        scenario.ancestor_path_lengths,
        distances,
    );
    compare(&mut problems, "degree", scenario.expected_degree, result.degree);
    compare(&mut problems, "removal", scenario.expected_removal, result.removal);
    compare(
        &mut problems,
        "description",
        scenario.expected_description.as_str(),
        describe::describe(&result).as_str(),
    );
    if let Some(kind) = scenario.expected_kind {
        compare(&mut problems, "kind", kind, result.kind);
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ScenarioMismatch {
            scenario: scenario.label(),
            problems,
        })
    }
}

/// Check every scenario of a file, collecting the failures.
pub fn check_all(snapshot: &Snapshot, file: &ScenarioFile) -> Vec<ScenarioMismatch> {
    file.scenarios
        .iter()
        .filter_map(|scenario| check_scenario(snapshot, scenario).err())
        .collect()
}
