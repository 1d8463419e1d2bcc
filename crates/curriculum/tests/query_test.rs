//! Integration tests for the query service.

use std::fs;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tempfile::TempDir;

use curriculum::{
    CachePolicy, ContentConfig, ContentStore, CurriculumError, EntityKind, Query, QueryOutput,
    QueryService,
};

fn create_service(policy: CachePolicy) -> (TempDir, QueryService) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("CURRICULUM.yaml"),
        r#"
domains:
  - {id: d1, name: Fundamentals, inquiry: Why GraphQL?, clusterIds: [c1]}
clusters:
  - {id: c1, name: Queries, inquiry: How to ask?, domainId: d1, conceptIds: [x1, x2]}
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("lesson-01.yaml"),
        r#"
concepts:
  - id: x1
    name: Fields
    inquiry: What is a field?
    objective: Select fields on a type
    reflectionPrompts: [Which fields did you need?]
    reflectionTargets: [Field selection]
    generalHints: [Start from the root Query type]
    exerciseIds: [e1]
  - id: x2
    name: Arguments
    inquiry: How do fields take arguments?
    objective: Pass arguments
    reflectionPrompts: [Why arguments?]
    reflectionTargets: [Arguments]
exercises:
  - id: e1
    inquiry: Fetch every user's name
    objective: Write a selection set
    difficulty: 1.5
    solutions: ["{ users { name } }", "query { users { name } }"]
    hints:
      - text: Selection sets use braces
        type: syntax
        trigger: "^[^{]*$"
    conceptIds: [x1]
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("lesson-02.yaml"),
        "concepts:\n  - {id: x3, name: Aliases, inquiry: q, objective: o, reflectionPrompts: [p], reflectionTargets: [t]}\n",
    )
    .unwrap();

    let config = ContentConfig::new(dir.path()).with_cache_policy(policy);
    let store = ContentStore::new(&config).expect("Failed to create store");
    (dir, QueryService::new(Arc::new(store)))
}

fn ids(output: &QueryOutput) -> Vec<String> {
    match output {
        QueryOutput::Many(items) => items.iter().map(|e| e.id().to_string()).collect(),
        QueryOutput::One(item) => item.iter().map(|e| e.id().to_string()).collect(),
    }
}

#[test]
fn test_list_operations() {
    let (_dir, service) = create_service(CachePolicy::Rebuild);

    assert_eq!(service.list_domains().len(), 1);
    assert_eq!(service.list_clusters().len(), 1);
    assert_eq!(
        service
            .list_concepts()
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>(),
        vec!["x1", "x2", "x3"]
    );
    let exercises = service.list_exercises();
    assert_eq!(exercises.len(), 1);
    assert_eq!(exercises[0].solutions.len(), 2);
    assert_eq!(exercises[0].hints[0].hint_type, "syntax");
}

#[test]
fn test_get_operations() {
    let (_dir, service) = create_service(CachePolicy::Rebuild);

    assert_eq!(service.get_domain("d1").unwrap().unwrap().name, "Fundamentals");
    assert_eq!(service.get_cluster("c1").unwrap().unwrap().domain_id, "d1");
    assert_eq!(service.get_concept("x1").unwrap().unwrap().exercise_ids, vec!["e1"]);
    assert_eq!(service.get_exercise("e1").unwrap().unwrap().difficulty, 1.5);
    assert!(service.get_concept("nope").unwrap().is_none());
    assert!(service.get_domain("x1").unwrap().is_none());
}

#[test]
fn test_empty_id_is_invalid_input() {
    let (_dir, service) = create_service(CachePolicy::Rebuild);

    assert!(matches!(
        service.get_concept(""),
        Err(CurriculumError::InvalidInput(_))
    ));
    assert!(matches!(
        service.concepts_by_cluster("   "),
        Err(CurriculumError::InvalidInput(_))
    ));
    assert!(matches!(
        service.lesson_by_id(""),
        Err(CurriculumError::InvalidInput(_))
    ));
    let query = Query::Get {
        kind: EntityKind::Exercise,
        id: String::new(),
    };
    assert!(service.execute(&query).unwrap_err().is_client_error());

    let query = Query::LessonById {
        lesson_id: " ".to_string(),
    };
    assert!(service.execute(&query).is_err());

    // Rejected before any content was read
    assert!(service.store().current().is_none());
}

#[test]
fn test_traversal_operations() {
    let (_dir, service) = create_service(CachePolicy::Rebuild);

    let concepts = service.concepts_by_cluster("c1").unwrap();
    assert_eq!(concepts.len(), 2);
    assert_eq!(concepts[0].id, "x1");
    assert_eq!(concepts[1].id, "x2");
    assert!(service.concepts_by_cluster("c404").unwrap().is_empty());

    assert_eq!(service.lesson_by_id("lesson-02").unwrap().unwrap().id, "x3");
    assert!(service.lesson_by_id("lesson-missing").unwrap().is_none());
}

#[test]
fn test_execute_parsed_queries() {
    let (_dir, service) = create_service(CachePolicy::Cached);
    let variables = |v: Value| -> Map<String, Value> { v.as_object().cloned().unwrap() };

    let query = Query::parse("conceptsByCluster", &variables(json!({"clusterId": "c1"}))).unwrap();
    assert_eq!(ids(&service.execute(&query).unwrap()), vec!["x1", "x2"]);

    let query = Query::parse("exercises", &Map::new()).unwrap();
    assert_eq!(ids(&service.execute(&query).unwrap()), vec!["e1"]);

    let query = Query::parse("lessonById", &variables(json!({"lessonId": "lesson-missing"}))).unwrap();
    assert!(service.execute(&query).unwrap().is_not_found());
}

#[test]
fn test_result_shape_is_camel_case() {
    let (_dir, service) = create_service(CachePolicy::Rebuild);
    let query = Query::Get {
        kind: EntityKind::Concept,
        id: "x1".to_string(),
    };
    let value = serde_json::to_value(service.execute(&query).unwrap()).unwrap();

    assert_eq!(value["id"], "x1");
    assert_eq!(value["reflectionPrompts"][0], "Which fields did you need?");
    assert_eq!(value["generalHints"][0]["type"], "general");
    assert_eq!(value["generalHints"][0]["text"], "Start from the root Query type");
    assert!(value["foundationIds"].as_array().unwrap().is_empty());
}

#[test]
fn test_reads_are_idempotent() {
    for policy in [CachePolicy::Rebuild, CachePolicy::Cached] {
        let (_dir, service) = create_service(policy);
        for kind in EntityKind::ALL {
            let query = Query::List(kind);
            let first = serde_json::to_string(&service.execute(&query).unwrap()).unwrap();
            let second = serde_json::to_string(&service.execute(&query).unwrap()).unwrap();
            assert_eq!(first, second);
        }
    }
}

#[test]
fn test_reload_through_service() {
    let (dir, service) = create_service(CachePolicy::Cached);
    assert_eq!(service.list_concepts().len(), 3);

    fs::remove_file(dir.path().join("lesson-02.yaml")).unwrap();
    assert_eq!(service.list_concepts().len(), 3);

    let outcome = service.reload();
    assert!(outcome.changed);
    assert_eq!(service.list_concepts().len(), 2);
}
