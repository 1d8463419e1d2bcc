//! The read API over the content store.
//!
//! Every operation is a pure read against one graph snapshot. Id parameters
//! are opaque strings; an empty one is rejected with
//! [`CurriculumError::InvalidInput`] before any lookup happens.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::content::{
    Cluster, Concept, ContentGraph, ContentStore, Domain, Entity, EntityKind, Exercise,
    ReloadOutcome,
};
use crate::error::{CurriculumError, Result};

/// A single named query operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    List(EntityKind),
    Get { kind: EntityKind, id: String },
    ConceptsByCluster { cluster_id: String },
    LessonById { lesson_id: String },
}

impl Query {
    /// Build a query from an operation name and its variables.
    ///
    /// Both the service names (`listConcepts`, `getConcept`) and the field
    /// names of the legacy schema (`concepts`, `concept`) are accepted.
    pub fn parse(operation: &str, variables: &Map<String, Value>) -> Result<Self> {
        let query = match operation.trim() {
            "listDomains" | "domains" => Query::List(EntityKind::Domain),
            "listClusters" | "clusters" => Query::List(EntityKind::Cluster),
            "listConcepts" | "concepts" => Query::List(EntityKind::Concept),
            "listExercises" | "exercises" => Query::List(EntityKind::Exercise),
            "getDomain" | "domain" => get(EntityKind::Domain, variables)?,
            "getCluster" | "cluster" => get(EntityKind::Cluster, variables)?,
            "getConcept" | "concept" => get(EntityKind::Concept, variables)?,
            "getExercise" | "exercise" => get(EntityKind::Exercise, variables)?,
            "conceptsByCluster" => Query::ConceptsByCluster {
                cluster_id: variable(variables, &["clusterId", "id"])?,
            },
            "lessonById" | "lesson" => Query::LessonById {
                lesson_id: variable(variables, &["lessonId", "id"])?,
            },
            "" => return Err(CurriculumError::invalid_input("operation is required")),
            other => {
                return Err(CurriculumError::invalid_input(format!(
                    "unknown operation '{}'",
                    other
                )));
            }
        };
        Ok(query)
    }

    /// Canonical operation name.
    pub fn operation(&self) -> &'static str {
        match self {
            Query::List(EntityKind::Domain) => "listDomains",
            Query::List(EntityKind::Cluster) => "listClusters",
            Query::List(EntityKind::Concept) => "listConcepts",
            Query::List(EntityKind::Exercise) => "listExercises",
            Query::Get { kind: EntityKind::Domain, .. } => "getDomain",
            Query::Get { kind: EntityKind::Cluster, .. } => "getCluster",
            Query::Get { kind: EntityKind::Concept, .. } => "getConcept",
            Query::Get { kind: EntityKind::Exercise, .. } => "getExercise",
            Query::ConceptsByCluster { .. } => "conceptsByCluster",
            Query::LessonById { .. } => "lessonById",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::List(_) => write!(f, "{}", self.operation()),
            Query::Get { id, .. } => write!(f, "{}(id: {:?})", self.operation(), id),
            Query::ConceptsByCluster { cluster_id } => {
                write!(f, "conceptsByCluster(clusterId: {:?})", cluster_id)
            }
            Query::LessonById { lesson_id } => write!(f, "lessonById(lessonId: {:?})", lesson_id),
        }
    }
}

fn get(kind: EntityKind, variables: &Map<String, Value>) -> Result<Query> {
    Ok(Query::Get {
        kind,
        id: variable(variables, &["id"])?,
    })
}

fn variable(variables: &Map<String, Value>, names: &[&str]) -> Result<String> {
    let value = names.iter().find_map(|name| variables.get(*name));
    match value {
        Some(Value::String(s)) => Ok(require_id(names[0], s)?.to_string()),
        Some(Value::Null) | None => Err(CurriculumError::invalid_input(format!(
            "missing required variable '{}'",
            names[0]
        ))),
        Some(_) => Err(CurriculumError::invalid_input(format!(
            "variable '{}' must be a string",
            names[0]
        ))),
    }
}

/// Reject empty or whitespace-only ids.
pub fn require_id<'a>(name: &str, id: &'a str) -> Result<&'a str> {
    if id.trim().is_empty() {
        return Err(CurriculumError::invalid_input(format!(
            "'{}' must be a non-empty string",
            name
        )));
    }
    Ok(id)
}

/// Result of executing a [`Query`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// Ordered sequence (possibly empty).
    Many(Vec<Entity>),
    /// Single entity, `null` when not found.
    One(Option<Entity>),
}

impl QueryOutput {
    /// Whether a point lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryOutput::One(None))
    }

    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Many(items) => items.len(),
            QueryOutput::One(item) => usize::from(item.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The stable query surface handed to request handlers.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<ContentStore>,
}

impl QueryService {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Snapshot used to answer the next query.
    pub fn graph(&self) -> Arc<ContentGraph> {
        self.store.graph()
    }

    /// Rebuild the content snapshot from disk.
    pub fn reload(&self) -> ReloadOutcome {
        self.store.reload()
    }

    pub fn execute(&self, query: &Query) -> Result<QueryOutput> {
        // Validate before taking a snapshot.
        match query {
            Query::List(_) => {}
            Query::Get { id, .. } => {
                require_id("id", id)?;
            }
            Query::ConceptsByCluster { cluster_id } => {
                require_id("clusterId", cluster_id)?;
            }
            Query::LessonById { lesson_id } => {
                require_id("lessonId", lesson_id)?;
            }
        }

        let graph = self.graph();
        let output = match query {
            Query::List(kind) => {
                QueryOutput::Many(graph.list(*kind).iter().map(|e| e.to_entity()).collect())
            }
            Query::Get { kind, id } => {
                QueryOutput::One(graph.get(*kind, id).map(|e| e.to_entity()))
            }
            Query::ConceptsByCluster { cluster_id } => QueryOutput::Many(
                graph
                    .concepts_by_cluster(cluster_id)
                    .into_iter()
                    .map(|c| Entity::Concept(c.clone()))
                    .collect(),
            ),
            Query::LessonById { lesson_id } => QueryOutput::One(
                graph
                    .lesson_by_id(lesson_id)
                    .map(|c| Entity::Concept(c.clone())),
            ),
        };
        Ok(output)
    }

    pub fn list_domains(&self) -> Vec<Domain> {
        self.graph().domains().to_vec()
    }

    pub fn list_clusters(&self) -> Vec<Cluster> {
        self.graph().clusters().to_vec()
    }

    pub fn list_concepts(&self) -> Vec<Concept> {
        self.graph().concepts().to_vec()
    }

    pub fn list_exercises(&self) -> Vec<Exercise> {
        self.graph().exercises().to_vec()
    }

    pub fn get_domain(&self, id: &str) -> Result<Option<Domain>> {
        let id = require_id("id", id)?;
        Ok(self.graph().domain(id).cloned())
    }

    pub fn get_cluster(&self, id: &str) -> Result<Option<Cluster>> {
        let id = require_id("id", id)?;
        Ok(self.graph().cluster(id).cloned())
    }

    pub fn get_concept(&self, id: &str) -> Result<Option<Concept>> {
        let id = require_id("id", id)?;
        Ok(self.graph().concept(id).cloned())
    }

    pub fn get_exercise(&self, id: &str) -> Result<Option<Exercise>> {
        let id = require_id("id", id)?;
        Ok(self.graph().exercise(id).cloned())
    }

    pub fn concepts_by_cluster(&self, cluster_id: &str) -> Result<Vec<Concept>> {
        let cluster_id = require_id("clusterId", cluster_id)?;
        Ok(self
            .graph()
            .concepts_by_cluster(cluster_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn lesson_by_id(&self, lesson_id: &str) -> Result<Option<Concept>> {
        let lesson_id = require_id("lessonId", lesson_id)?;
        Ok(self.graph().lesson_by_id(lesson_id).cloned())
    }
}
