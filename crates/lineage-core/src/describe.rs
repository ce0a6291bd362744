//! English labels for relationship results.
//!
//! The classifier itself stays numeric; these labels are for reports and
//! the golden fixtures.

use crate::consanguinity::{RelationshipKind, RelationshipResult};

const ORDINAL_WORDS: [&str; 12] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
    "eleventh", "twelfth",
];

/// Ordinal of a cousin degree: words up to twelfth, then `13th`, `21st`, ...
#[must_use]
pub fn ordinal(degree: u32) -> String {
    if let Some(word) = degree
        .checked_sub(1)
        .and_then(|i| ORDINAL_WORDS.get(i as usize))
    {
        return (*word).to_string();
    }
    let suffix = match (degree % 10, degree % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{degree}{suffix}")
}

/// Removal phrase: `once removed`, `twice removed`, `N times removed`.
#[must_use]
pub fn removal_words(removal: u32) -> String {
    match removal {
        1 => "once removed".to_string(),
        2 => "twice removed".to_string(),
        n => format!("{n} times removed"),
    }
}

fn with_removal(base: String, removal: u32) -> String {
    if removal == 0 {
        base
    } else {
        format!("{base} {}", removal_words(removal))
    }
}

/// Describe a classification in English.
#[must_use]
pub fn describe(result: &RelationshipResult) -> String {
    match result.kind {
        RelationshipKind::Same => "same person".to_string(),
        RelationshipKind::Unrelated => "unrelated".to_string(),
        RelationshipKind::DepthExceeded => "no relationship within search depth".to_string(),
        RelationshipKind::Direct => match result.degree.unwrap_or(0) {
            0 | 1 => "ancestor/descendant".to_string(),
            generations => format!("ancestor/descendant ({generations} generations)"),
        },
        RelationshipKind::Collateral => {
            let removal = result.removal.unwrap_or(0);
            match result.degree.unwrap_or(0) {
                0 => with_removal("siblings".to_string(), removal),
                degree => with_removal(format!("{} cousins", ordinal(degree)), removal),
            }
        }
    }
}
