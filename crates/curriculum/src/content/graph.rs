//! The in-memory content graph.
//!
//! A graph is assembled once from a set of loaded documents and never mutated
//! afterwards. Every entity id is indexed globally at build time, so point
//! lookups and relationship traversal never rescan the collections.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::loader::ContentDocument;
use super::model::{Cluster, Concept, Domain, EntityKind, EntityRef, Exercise, Record};

/// Position of an entity inside its kind's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    kind: EntityKind,
    position: usize,
}

/// A reference whose target does not exist with the expected kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub source_kind: EntityKind,
    pub source_id: String,
    pub field: &'static str,
    pub target_kind: EntityKind,
    pub target_id: String,
}

/// A record dropped because its id was already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateId {
    pub kind: EntityKind,
    pub id: String,
    /// Document carrying the dropped record.
    pub document: String,
}

/// Per-document bookkeeping kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub digest: String,
    pub records: usize,
    pub rejected: usize,
}

/// Entity counts and diagnostic totals for a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub documents: usize,
    pub domains: usize,
    pub clusters: usize,
    pub concepts: usize,
    pub exercises: usize,
    pub rejected_records: usize,
    pub duplicate_ids: usize,
    pub dangling_references: usize,
}

/// Immutable, id-indexed view of all loaded content.
#[derive(Debug, Clone, Default)]
pub struct ContentGraph {
    domains: Vec<Domain>,
    clusters: Vec<Cluster>,
    concepts: Vec<Concept>,
    exercises: Vec<Exercise>,
    index: HashMap<String, Slot>,
    /// Lesson id -> position of the lesson's primary concept.
    lessons: IndexMap<String, Option<usize>>,
    /// Lesson document file name -> lesson id.
    lesson_files: HashMap<String, String>,
    documents: Vec<DocumentInfo>,
    duplicates: Vec<DuplicateId>,
    dangling: Vec<DanglingReference>,
    revision: String,
}

impl ContentGraph {
    /// Assemble a graph from the curriculum document and lesson documents.
    ///
    /// Collections keep load order: the curriculum document first, then each
    /// lesson in the order given. Only lesson documents are addressable through
    /// [`lesson_by_id`](Self::lesson_by_id).
    pub fn build(curriculum: Option<ContentDocument>, lessons: Vec<ContentDocument>) -> Self {
        let mut graph = Self::default();

        if let Some(doc) = curriculum {
            graph.absorb(doc);
        }
        for doc in lessons {
            let lesson_id = doc.lesson_id.clone();
            let file_name = doc.name.clone();
            let first_concept = doc.concepts.first().map(|c| c.id.clone());
            graph.absorb(doc);

            let primary = first_concept.and_then(|id| match graph.index.get(&id) {
                Some(slot) if slot.kind == EntityKind::Concept => Some(slot.position),
                _ => None,
            });
            graph
                .lesson_files
                .entry(file_name)
                .or_insert_with(|| lesson_id.clone());
            graph.lessons.entry(lesson_id).or_insert(primary);
        }

        graph.dangling = graph.find_dangling();
        graph.revision = graph.compute_revision();
        graph
    }

    fn absorb(&mut self, doc: ContentDocument) {
        let records = doc.record_count();
        let ContentDocument {
            name,
            digest,
            domains,
            clusters,
            concepts,
            exercises,
            rejected,
            ..
        } = doc;

        insert_all(&mut self.index, &mut self.duplicates, &mut self.domains, domains, &name);
        insert_all(&mut self.index, &mut self.duplicates, &mut self.clusters, clusters, &name);
        insert_all(&mut self.index, &mut self.duplicates, &mut self.concepts, concepts, &name);
        insert_all(&mut self.index, &mut self.duplicates, &mut self.exercises, exercises, &name);

        self.documents.push(DocumentInfo {
            name,
            digest,
            records,
            rejected,
        });
    }

    fn find_dangling(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        self.check_references(&self.domains, &mut dangling);
        self.check_references(&self.clusters, &mut dangling);
        self.check_references(&self.concepts, &mut dangling);
        self.check_references(&self.exercises, &mut dangling);
        dangling
    }

    fn check_references<T: Record>(&self, records: &[T], out: &mut Vec<DanglingReference>) {
        for record in records {
            for reference in record.references() {
                let resolved = self
                    .index
                    .get(reference.target)
                    .is_some_and(|slot| slot.kind == reference.target_kind);
                if !resolved {
                    debug!(
                        source = record.id(),
                        field = reference.field,
                        target = reference.target,
                        "dangling reference"
                    );
                    out.push(DanglingReference {
                        source_kind: T::KIND,
                        source_id: record.id().to_string(),
                        field: reference.field,
                        target_kind: reference.target_kind,
                        target_id: reference.target.to_string(),
                    });
                }
            }
        }
    }

    fn compute_revision(&self) -> String {
        let mut hasher = Sha256::new();
        for doc in &self.documents {
            hasher.update(doc.name.as_bytes());
            hasher.update([0]);
            hasher.update(doc.digest.as_bytes());
            hasher.update([b'\n']);
        }
        format!("sha256:{:x}", hasher.finalize())
    }

    // ---------------------------------------------------------------------
    // Collections
    // ---------------------------------------------------------------------

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// All entities of one kind, in load order.
    pub fn list(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        match kind {
            EntityKind::Domain => self.domains.iter().map(EntityRef::Domain).collect(),
            EntityKind::Cluster => self.clusters.iter().map(EntityRef::Cluster).collect(),
            EntityKind::Concept => self.concepts.iter().map(EntityRef::Concept).collect(),
            EntityKind::Exercise => self.exercises.iter().map(EntityRef::Exercise).collect(),
        }
    }

    // ---------------------------------------------------------------------
    // Point lookups
    // ---------------------------------------------------------------------

    fn slot(&self, kind: EntityKind, id: &str) -> Option<usize> {
        self.index
            .get(id)
            .filter(|slot| slot.kind == kind)
            .map(|slot| slot.position)
    }

    /// The entity of `kind` with `id`. An id held by another kind is not found.
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<EntityRef<'_>> {
        let position = self.slot(kind, id)?;
        Some(match kind {
            EntityKind::Domain => EntityRef::Domain(&self.domains[position]),
            EntityKind::Cluster => EntityRef::Cluster(&self.clusters[position]),
            EntityKind::Concept => EntityRef::Concept(&self.concepts[position]),
            EntityKind::Exercise => EntityRef::Exercise(&self.exercises[position]),
        })
    }

    pub fn domain(&self, id: &str) -> Option<&Domain> {
        self.slot(EntityKind::Domain, id).map(|i| &self.domains[i])
    }

    pub fn cluster(&self, id: &str) -> Option<&Cluster> {
        self.slot(EntityKind::Cluster, id).map(|i| &self.clusters[i])
    }

    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.slot(EntityKind::Concept, id).map(|i| &self.concepts[i])
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.slot(EntityKind::Exercise, id).map(|i| &self.exercises[i])
    }

    // ---------------------------------------------------------------------
    // Traversal
    // ---------------------------------------------------------------------

    /// Concepts of a cluster in the cluster's declared order.
    ///
    /// Unknown clusters yield an empty list; concept ids that do not resolve
    /// are skipped.
    pub fn concepts_by_cluster(&self, cluster_id: &str) -> Vec<&Concept> {
        let Some(cluster) = self.cluster(cluster_id) else {
            return Vec::new();
        };
        cluster
            .concept_ids
            .iter()
            .filter_map(|id| self.concept(id))
            .collect()
    }

    /// The primary (first) concept of a lesson document.
    ///
    /// Accepts the lesson id or the exact file name of a lesson document.
    pub fn lesson_by_id(&self, lesson_id: &str) -> Option<&Concept> {
        let position = match self.lessons.get(lesson_id) {
            Some(position) => *position,
            None => *self.lessons.get(self.lesson_files.get(lesson_id)?)?,
        };
        position.map(|i| &self.concepts[i])
    }

    /// Lesson ids in discovery order.
    pub fn lesson_ids(&self) -> impl Iterator<Item = &str> {
        self.lessons.keys().map(String::as_str)
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    /// References that do not resolve to an entity of the expected kind.
    pub fn dangling_references(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Records dropped because their id was already in use.
    pub fn duplicates(&self) -> &[DuplicateId] {
        &self.duplicates
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    /// Fingerprint of the documents this graph was built from.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            documents: self.documents.len(),
            domains: self.domains.len(),
            clusters: self.clusters.len(),
            concepts: self.concepts.len(),
            exercises: self.exercises.len(),
            rejected_records: self.documents.iter().map(|d| d.rejected).sum(),
            duplicate_ids: self.duplicates.len(),
            dangling_references: self.dangling.len(),
        }
    }

    /// Whether the content has no duplicates, dangling references, or
    /// rejected records.
    pub fn is_consistent(&self) -> bool {
        let summary = self.summary();
        summary.duplicate_ids == 0
            && summary.dangling_references == 0
            && summary.rejected_records == 0
    }
}

fn insert_all<T: Record>(
    index: &mut HashMap<String, Slot>,
    duplicates: &mut Vec<DuplicateId>,
    collection: &mut Vec<T>,
    records: Vec<T>,
    document: &str,
) {
    for record in records {
        if index.contains_key(record.id()) {
            debug!(kind = %T::KIND, id = record.id(), document, "duplicate id dropped");
            duplicates.push(DuplicateId {
                kind: T::KIND,
                id: record.id().to_string(),
                document: document.to_string(),
            });
            continue;
        }
        index.insert(
            record.id().to_string(),
            Slot {
                kind: T::KIND,
                position: collection.len(),
            },
        );
        collection.push(record);
    }
}
