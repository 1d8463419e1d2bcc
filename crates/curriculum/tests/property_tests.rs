//! Property-based tests for graph assembly.
//!
//! These tests generate random corpora and verify that lookups and traversal
//! keep their invariants:
//! 1. **Identity**: `get(kind, id)` returns a record carrying `id`
//! 2. **Totality**: unknown ids are not found, never a panic
//! 3. **Ordering**: `concepts_by_cluster` follows the cluster's declared order
//! 4. **Determinism**: the same documents always produce the same graph

use std::collections::HashSet;

use proptest::prelude::*;

use curriculum::content::{ContentDocument, ContentGraph, EntityKind};
use curriculum::{Cluster, Concept, Domain};

// =============================================================================
// Test Strategies
// =============================================================================

fn id_like() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

fn make_concept(id: &str) -> Concept {
    Concept {
        id: id.to_string(),
        name: format!("Concept {}", id),
        inquiry: "q".to_string(),
        objective: "o".to_string(),
        reflection_prompts: vec!["p".to_string()],
        reflection_targets: vec!["t".to_string()],
        general_hints: Vec::new(),
        optional_hints: Vec::new(),
        foundation_ids: Vec::new(),
        extension_ids: Vec::new(),
        exercise_ids: Vec::new(),
        resource_ids: Vec::new(),
    }
}

/// Distinct concept ids plus a cluster referencing a mix of known and unknown ids.
fn corpus() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    (
        prop::collection::hash_set(id_like(), 1..20),
        prop::collection::vec(id_like(), 0..25),
    )
        .prop_map(|(ids, refs)| {
            let mut concept_ids: Vec<String> = ids.into_iter().map(|id| format!("x-{}", id)).collect();
            concept_ids.sort();
            let mut cluster_refs = Vec::new();
            for (i, r) in refs.into_iter().enumerate() {
                if i % 2 == 0 && !concept_ids.is_empty() {
                    cluster_refs.push(concept_ids[i % concept_ids.len()].clone());
                } else {
                    cluster_refs.push(format!("missing-{}", r));
                }
            }
            (concept_ids, cluster_refs)
        })
}

fn build(concept_ids: &[String], cluster_refs: &[String]) -> ContentGraph {
    let curriculum = ContentDocument {
        name: "CURRICULUM.yaml".to_string(),
        lesson_id: "CURRICULUM".to_string(),
        domains: vec![Domain {
            id: "d1".to_string(),
            name: "Domain".to_string(),
            inquiry: "q".to_string(),
            cluster_ids: vec!["c1".to_string()],
            recommended_order: None,
        }],
        clusters: vec![Cluster {
            id: "c1".to_string(),
            name: "Cluster".to_string(),
            inquiry: String::new(),
            domain_id: "d1".to_string(),
            concept_ids: cluster_refs.to_vec(),
            recommended_order: None,
        }],
        ..Default::default()
    };
    let lessons = concept_ids
        .iter()
        .enumerate()
        .map(|(i, id)| ContentDocument {
            name: format!("lesson-{:03}.yaml", i),
            lesson_id: format!("lesson-{:03}", i),
            concepts: vec![make_concept(id)],
            ..Default::default()
        })
        .collect();
    ContentGraph::build(Some(curriculum), lessons)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_get_returns_requested_id((concept_ids, refs) in corpus()) {
        let graph = build(&concept_ids, &refs);
        for id in &concept_ids {
            let entity = graph.get(EntityKind::Concept, id);
            prop_assert!(entity.is_some());
            prop_assert_eq!(entity.unwrap().id(), id.as_str());
        }
    }

    #[test]
    fn prop_unknown_ids_not_found((concept_ids, refs) in corpus(), probe in "[A-Z]{1,8}") {
        let graph = build(&concept_ids, &refs);
        for kind in EntityKind::ALL {
            prop_assert!(graph.get(kind, &probe).is_none());
        }
    }

    #[test]
    fn prop_cluster_order_preserved((concept_ids, refs) in corpus()) {
        let graph = build(&concept_ids, &refs);
        let known: HashSet<&str> = concept_ids.iter().map(String::as_str).collect();
        let expected: Vec<&str> = refs
            .iter()
            .map(String::as_str)
            .filter(|id| known.contains(id))
            .collect();
        let actual: Vec<&str> = graph
            .concepts_by_cluster("c1")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        prop_assert_eq!(actual, expected);

        let dangling = refs.iter().filter(|r| !known.contains(r.as_str())).count();
        prop_assert_eq!(graph.dangling_references().len(), dangling);
    }

    #[test]
    fn prop_build_is_deterministic((concept_ids, refs) in corpus()) {
        let a = build(&concept_ids, &refs);
        let b = build(&concept_ids, &refs);
        prop_assert_eq!(a.revision(), b.revision());
        prop_assert_eq!(a.concepts(), b.concepts());
        prop_assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn prop_every_lesson_resolves((concept_ids, refs) in corpus()) {
        let graph = build(&concept_ids, &refs);
        for (i, id) in concept_ids.iter().enumerate() {
            let lesson = graph.lesson_by_id(&format!("lesson-{:03}", i));
            prop_assert_eq!(lesson.map(|c| c.id.as_str()), Some(id.as_str()));
        }
    }
}
