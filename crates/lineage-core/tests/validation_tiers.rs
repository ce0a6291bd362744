//! # Validation Tier Tests (T0-T5)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Graph Integrity
//! - T1: Sosa Numbering
//! - T2: Consanguinity
//! - T3: Relationship Paths
//! - T4: Snapshot Reload
//! - T5: Kinship Coefficients

use lineage_core::{
    Branch, ClassifyOptions, Coefficient, EdgeLabel, Engine, FamilyRecord, GraphFault, GraphVersion,
    KinshipGraph, KinshipStore, LineageError, PathOutcome, PersonKey, PersonRecord, RecordSet,
    RelationshipKind, Sex, SosaLookup, SosaNumber,
};

fn key(s: &str) -> PersonKey {
    PersonKey::new(s)
}

fn n(value: u64) -> SosaNumber {
    SosaNumber::try_from(value).expect("positive")
}

/// Four generations descending from g1 + g2.
///
/// ```text
///              g1 + g2
///          ┌──────┴──────┐
///   sa + a1              b1 + sb
///        │            ┌───┴───┐
///   ta + a2           b2      b2x
///        │            │
///        a3           b3
/// ```
fn pedigree() -> RecordSet {
    let mut records = RecordSet::new();
    for (name, sex) in [
        ("g1", Sex::Male),
        ("g2", Sex::Female),
        ("a1", Sex::Male),
        ("sa", Sex::Female),
        ("b1", Sex::Female),
        ("sb", Sex::Male),
        ("a2", Sex::Female),
        ("ta", Sex::Male),
        ("b2", Sex::Male),
        ("b2x", Sex::Female),
        ("a3", Sex::Male),
        ("b3", Sex::Female),
        ("stranger", Sex::Unknown),
    ] {
        records.push_person(PersonRecord::new(name, sex));
    }
    records
        .push_family(
            FamilyRecord::new("F_g", Some(key("g1")), Some(key("g2")))
                .with_child("a1")
                .with_child("b1"),
        )
        .push_family(FamilyRecord::new("F_a", Some(key("a1")), Some(key("sa"))).with_child("a2"))
        .push_family(
            FamilyRecord::new("F_b", Some(key("sb")), Some(key("b1")))
                .with_child("b2")
                .with_child("b2x"),
        )
        .push_family(FamilyRecord::new("F_a2", Some(key("ta")), Some(key("a2"))).with_child("a3"))
        .push_family(FamilyRecord::new("F_b2", Some(key("b2")), None).with_child("b3"));
    records
}

fn engine() -> Engine {
    Engine::new(pedigree()).expect("engine")
}

// =============================================================================
// TIER T0: GRAPH INTEGRITY
// =============================================================================

mod t0_graph_integrity {
    use super::*;

    /// T0.1: A well-formed record set builds and exposes every edge kind.
    #[test]
    fn well_formed_set_builds() {
        let graph = KinshipGraph::build(pedigree(), GraphVersion::INITIAL).expect("build");

        assert_eq!(graph.person_count(), 13);
        assert_eq!(graph.family_count(), 5);
        let parents = graph.parents_of(&key("b2")).expect("parents");
        assert_eq!(parents.father, Some(key("sb")));
        assert_eq!(parents.mother, Some(key("b1")));
        assert_eq!(graph.children_of(&key("b1")).expect("children").len(), 2);
        assert!(graph.spouses_of(&key("b2")).expect("spouses").is_empty());
    }

    /// T0.2: A dangling parent reference rejects the whole set.
    #[test]
    fn dangling_reference_rejected() {
        let mut records = pedigree();
        records.push_family(FamilyRecord::new("F_x", Some(key("nobody")), None));

        let result = KinshipGraph::build(records, GraphVersion::INITIAL);
        assert!(matches!(result, Err(LineageError::MalformedGraph(_))));
    }

    /// T0.3: A person who is their own ancestor rejects the whole set.
    #[test]
    fn parent_cycle_rejected() {
        let mut records = pedigree();
        // g1 becomes a child of a3, closing a loop through four generations.
        records.push_family(FamilyRecord::new("F_loop", Some(key("a3")), None).with_child("g1"));

        let result = KinshipGraph::build(records, GraphVersion::INITIAL);
        assert!(matches!(
            result,
            Err(LineageError::MalformedGraph(GraphFault::ParentCycle { .. }))
        ));
    }

    /// T0.4: More than two parents (two families of origin) is rejected.
    #[test]
    fn three_parents_rejected() {
        let mut records = pedigree();
        records.push_family(FamilyRecord::new("F_other", Some(key("stranger")), None).with_child("a3"));

        let result = KinshipGraph::build(records, GraphVersion::INITIAL);
        assert!(matches!(
            result,
            Err(LineageError::MalformedGraph(GraphFault::ConflictingParentage { .. }))
        ));
    }

    /// T0.5: Lookups on absent keys fail with UnknownPerson.
    #[test]
    fn unknown_person_lookup() {
        let graph = KinshipGraph::build(pedigree(), GraphVersion::INITIAL).expect("build");
        assert!(!graph.exists(&key("ghost")));
        assert_eq!(
            graph.children_of(&key("ghost")),
            Err(LineageError::UnknownPerson(key("ghost")))
        );
    }
}

// =============================================================================
// TIER T1: SOSA NUMBERING
// =============================================================================

mod t1_sosa_numbering {
    use super::*;

    /// T1.1: Root, father, mother and grandparents get the classical numbers.
    #[test]
    fn classical_numbers() {
        let engine = engine();
        let sosa = |target: &str| {
            engine
                .sosa_of(&key("a3"), &key(target))
                .expect("sosa")
                .number()
                .cloned()
        };

        assert_eq!(sosa("a3"), Some(n(1)));
        assert_eq!(sosa("ta"), Some(n(2)));
        assert_eq!(sosa("a2"), Some(n(3)));
        assert_eq!(sosa("a1"), Some(n(6)));
        assert_eq!(sosa("sa"), Some(n(7)));
        assert_eq!(sosa("g1"), Some(n(12)));
        assert_eq!(sosa("g2"), Some(n(13)));
    }

    /// T1.2: Branch and generation are read off the number.
    #[test]
    fn branch_and_generation() {
        assert_eq!(Engine::branch_of(&n(1)), Branch::Root);
        assert_eq!(Engine::branch_of(&n(12)), Branch::Paternal);
        assert_eq!(Engine::branch_of(&n(13)), Branch::Maternal);
        assert_eq!(Engine::generation_of(&n(12)), 4);
        assert_eq!(Engine::generation_of(&n(1)), 1);
    }

    /// T1.3: Non-ancestors are a value, not an error.
    #[test]
    fn non_ancestors() {
        let engine = engine();
        assert_eq!(
            engine.sosa_of(&key("a3"), &key("b3")).expect("sosa"),
            SosaLookup::NotAncestor
        );
        assert_eq!(
            engine.sosa_of(&key("g1"), &key("a1")).expect("sosa"),
            SosaLookup::NotAncestor
        );
    }

    /// T1.4: A missing parent ends the branch without placeholders.
    #[test]
    fn incomplete_cone_terminates() {
        let engine = engine();
        let table = engine.sosa_table(&key("b3")).expect("table");

        // b3 has only a father (b2); slot 3 stays empty.
        assert_eq!(table.number_of(&key("b2")), Some(&n(2)));
        assert_eq!(table.person_at(&n(3)), None);
        assert_eq!(table.number_of(&key("g2")), Some(&n(11)));
        assert_eq!(table.len(), 6);
        assert_eq!(table.max_generation(), 4);
    }

    /// T1.5: Chains and numbers translate both ways.
    #[test]
    fn chains_translate() {
        let engine = engine();
        let chain = engine
            .ancestor_chain(&key("a3"), &n(13))
            .expect("chain")
            .expect("complete chain");
        assert_eq!(chain, vec![key("g2"), key("a1"), key("a2"), key("a3")]);
        assert_eq!(
            engine.snapshot().sosa_of_chain(&chain).expect("number"),
            Some(n(13))
        );
    }
}

// =============================================================================
// TIER T2: CONSANGUINITY
// =============================================================================

mod t2_consanguinity {
    use super::*;

    fn degree_removal(engine: &Engine, a: &str, b: &str) -> (Option<u32>, Option<u32>) {
        let result = engine.classify(&key(a), &key(b)).expect("classify");
        (result.degree, result.removal)
    }

    /// T2.1: Same person is SELF with degree 0.
    #[test]
    fn same_person() {
        let result = engine().classify(&key("a2"), &key("a2")).expect("classify");
        assert_eq!(result.kind, RelationshipKind::Same);
        assert_eq!(result.degree, Some(0));
    }

    /// T2.2: The classical collateral table.
    #[test]
    fn collateral_table() {
        let engine = engine();
        assert_eq!(degree_removal(&engine, "a1", "b1"), (Some(0), Some(0)));
        assert_eq!(degree_removal(&engine, "a2", "b2"), (Some(1), Some(0)));
        assert_eq!(degree_removal(&engine, "a2", "b3"), (Some(1), Some(1)));
        assert_eq!(degree_removal(&engine, "a3", "b3"), (Some(2), Some(0)));
        assert_eq!(degree_removal(&engine, "a1", "b2"), (Some(0), Some(1)));
    }

    /// T2.3: Direct lines report the generation gap.
    #[test]
    fn direct_lines() {
        let engine = engine();
        let parent = engine.classify(&key("a3"), &key("a2")).expect("classify");
        assert_eq!(parent.kind, RelationshipKind::Direct);
        assert_eq!(parent.degree, Some(1));

        let great = engine.classify(&key("g1"), &key("a3")).expect("classify");
        assert_eq!(great.kind, RelationshipKind::Direct);
        assert_eq!((great.distance_a, great.distance_b), (Some(0), Some(3)));
        assert_eq!(Engine::describe(&great), "ancestor/descendant (3 generations)");
    }

    /// T2.4: Swapping subjects swaps only the distances.
    #[test]
    fn symmetry() {
        let engine = engine();
        let ab = engine.classify(&key("a2"), &key("b3")).expect("classify");
        let ba = engine.classify(&key("b3"), &key("a2")).expect("classify");
        assert_eq!(ab.swapped(), ba);
        assert_eq!((ab.degree, ab.removal), (ba.degree, ba.removal));
    }

    /// T2.5: Equal-distance ancestors tie-break on the smallest key.
    #[test]
    fn key_tie_break() {
        let engine = engine();
        let result = engine.classify(&key("b2"), &key("b2x")).expect("classify");
        assert_eq!(result.common_ancestor, Some(key("b1")));

        let ranked = engine.common_ancestors(&key("b2"), &key("b2x")).expect("ranked");
        let names: Vec<_> = ranked.iter().map(|c| c.person.as_str()).collect();
        assert_eq!(names, vec!["b1", "sb", "g1", "g2"]);
    }

    /// T2.5b: At equal total distance the balanced ancestor wins, even when
    /// the lopsided one has the smaller key.
    #[test]
    fn balanced_before_key_tie_break() {
        let mut records = RecordSet::new();
        for name in ["a", "ax", "b", "m", "p", "q", "r", "y"] {
            records.push_person(PersonRecord::new(name, Sex::Unknown));
        }
        records
            .push_family(FamilyRecord::new("fa", Some(key("ax")), Some(key("m"))).with_child("a"))
            .push_family(FamilyRecord::new("fm", Some(key("y")), None).with_child("m"))
            .push_family(FamilyRecord::new("fb", Some(key("p")), Some(key("r"))).with_child("b"))
            .push_family(FamilyRecord::new("fp", Some(key("q")), None).with_child("p"))
            .push_family(FamilyRecord::new("fq", Some(key("ax")), None).with_child("q"))
            .push_family(FamilyRecord::new("fr", Some(key("y")), None).with_child("r"));
        let engine = Engine::new(records).expect("engine");

        let result = engine.classify(&key("a"), &key("b")).expect("classify");
        assert_eq!(result.kind, RelationshipKind::Collateral);
        assert_eq!(result.common_ancestor, Some(key("y")));
        assert_eq!((result.distance_a, result.distance_b), (Some(2), Some(2)));
        assert_eq!(Engine::describe(&result), "first cousins");
    }

    /// T2.6: Disjoint cones are UNRELATED; a cut-off search can say so.
    #[test]
    fn unrelated_and_depth_exceeded() {
        let engine = engine();
        let result = engine.classify(&key("a3"), &key("stranger")).expect("classify");
        assert_eq!(result.kind, RelationshipKind::Unrelated);
        assert_eq!(result.common_ancestor, None);

        let shallow = ClassifyOptions::default()
            .with_max_depth(2)
            .distinguishing_depth_exceeded(true);
        let cut = engine
            .classify_with(&key("a3"), &key("b3"), shallow)
            .expect("classify");
        assert_eq!(cut.kind, RelationshipKind::DepthExceeded);
        assert_eq!(Engine::describe(&cut), "no relationship within search depth");
    }

    /// T2.7: Unknown subjects are errors.
    #[test]
    fn unknown_subject() {
        assert_eq!(
            engine().classify(&key("ghost"), &key("a1")),
            Err(LineageError::UnknownPerson(key("ghost")))
        );
    }
}

// =============================================================================
// TIER T3: RELATIONSHIP PATHS
// =============================================================================

mod t3_relationship_paths {
    use super::*;

    /// T3.1: Cousins meet through the closer shared parent.
    #[test]
    fn cousins_path() {
        let outcome = engine()
            .shortest_path(&key("a2"), &key("b2"), 10)
            .expect("path");
        let path = outcome.path().expect("found");
        let persons: Vec<_> = path.persons().map(PersonKey::as_str).collect();
        // a1 -> g1 and a1 -> g2 tie; g1 sorts first.
        assert_eq!(persons, vec!["a2", "a1", "g1", "b1", "b2"]);
        let labels: Vec<_> = path.labels().collect();
        assert_eq!(
            labels,
            vec![
                EdgeLabel::ParentOf,
                EdgeLabel::ParentOf,
                EdgeLabel::ChildOf,
                EdgeLabel::ChildOf
            ]
        );
    }

    /// T3.2: In-laws are reached through spouse edges.
    #[test]
    fn in_law_path() {
        let outcome = engine()
            .shortest_path(&key("sa"), &key("g2"), 10)
            .expect("path");
        let path = outcome.path().expect("found");
        let labels: Vec<_> = path.labels().collect();
        assert_eq!(labels, vec![EdgeLabel::SpouseOf, EdgeLabel::ParentOf]);
    }

    /// T3.3: The distance budget is honored.
    #[test]
    fn distance_budget() {
        let engine = engine();
        assert_eq!(
            engine.shortest_path(&key("a3"), &key("b3"), 3).expect("path"),
            PathOutcome::DistanceExceeded
        );
        let found = engine.shortest_path(&key("a3"), &key("b3"), 6).expect("path");
        assert_eq!(found.path().map(|p| p.len()), Some(6));
    }

    /// T3.4: Disconnected persons yield NotFound.
    #[test]
    fn disconnected() {
        assert_eq!(
            engine()
                .shortest_path(&key("a3"), &key("stranger"), 40)
                .expect("path"),
            PathOutcome::NotFound
        );
    }
}

// =============================================================================
// TIER T4: SNAPSHOT RELOAD
// =============================================================================

mod t4_snapshot_reload {
    use super::*;

    /// T4.1: Reloading identical records gives identical answers.
    #[test]
    fn identical_reload_identical_answers() {
        let engine = engine();
        let before_sosa = engine.sosa_of(&key("a3"), &key("g2")).expect("sosa");
        let before_class = engine.classify(&key("a3"), &key("b3")).expect("classify");

        let version = engine.reload(pedigree()).expect("reload");
        assert_eq!(version, GraphVersion(2));

        assert_eq!(engine.sosa_of(&key("a3"), &key("g2")).expect("sosa"), before_sosa);
        assert_eq!(engine.classify(&key("a3"), &key("b3")).expect("classify"), before_class);
    }

    /// T4.2: A pinned snapshot is unaffected by a reload.
    #[test]
    fn pinned_snapshot_survives() {
        let engine = engine();
        let pinned = engine.snapshot();

        let mut smaller = pedigree();
        smaller.families.retain(|family| family.key.as_str() != "F_a2");
        engine.reload(smaller).expect("reload");

        assert_eq!(
            engine.sosa_of(&key("a3"), &key("a2")).expect("sosa"),
            SosaLookup::NotAncestor
        );
        assert_eq!(
            pinned.sosa_of(&key("a3"), &key("a2")).expect("sosa"),
            SosaLookup::Ancestor(n(3))
        );
    }

    /// T4.3: A rejected reload leaves the live version in place.
    #[test]
    fn rejected_reload() {
        let engine = engine();
        let mut broken = pedigree();
        broken.push_person(PersonRecord::new("a1", Sex::Male));

        assert!(engine.reload(broken).is_err());
        assert_eq!(engine.version(), GraphVersion::INITIAL);
    }
}

// =============================================================================
// TIER T5: KINSHIP COEFFICIENTS
// =============================================================================

mod t5_kinship_coefficients {
    use super::*;

    fn phi(engine: &Engine, a: &str, b: &str) -> Coefficient {
        engine.kinship_coefficient(&key(a), &key(b)).expect("kinship")
    }

    /// T5.1: Classical values along the g1 + g2 descent.
    #[test]
    fn classical_values() {
        let engine = engine();
        assert_eq!(phi(&engine, "a1", "b1"), Coefficient::power_of_half(2));
        assert_eq!(phi(&engine, "a2", "b2"), Coefficient::power_of_half(4));
        assert_eq!(phi(&engine, "a3", "b2"), Coefficient::power_of_half(5));
        assert_eq!(phi(&engine, "a3", "b3"), Coefficient::power_of_half(6));
        assert_eq!(phi(&engine, "g1", "a3"), Coefficient::power_of_half(4));
        assert!(phi(&engine, "stranger", "a1").is_zero());
    }

    /// T5.2: The child of first cousins has F = 1/16.
    #[test]
    fn child_of_first_cousins() {
        let mut records = pedigree();
        records.push_person(PersonRecord::new("ab", Sex::Unknown));
        records.push_family(FamilyRecord::new("F_ab", Some(key("b2")), Some(key("a2"))).with_child("ab"));
        let engine = Engine::new(records).expect("engine");

        assert_eq!(
            engine.consanguinity(&key("ab")).expect("f"),
            Coefficient::power_of_half(4)
        );
        assert!(engine.consanguinity(&key("a3")).expect("f").is_zero());
    }

    /// T5.3: The summary names both grandparents of first cousins, each with
    /// one line of length 2 on either side.
    #[test]
    fn summary_of_first_cousins() {
        let engine = engine();
        let summary = engine.relationship_summary(&key("a2"), &key("b2")).expect("summary");

        assert_eq!(summary.coefficient, Coefficient::power_of_half(4));
        let nearest: Vec<_> = summary.ancestors.iter().map(|a| a.ancestor.as_str()).collect();
        assert_eq!(nearest, vec!["g1", "g2"]);
        for links in &summary.ancestors {
            assert_eq!(links.distances(), Some((2, 2)));
            assert_eq!(
                links.paths_to_a[0].path,
                vec![links.ancestor.clone(), key("a1"), key("a2")]
            );
        }
    }
}
