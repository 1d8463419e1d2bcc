//! Content resolution: loading documents and assembling the content graph.
//!
//! # Layout
//!
//! ```text
//! lessons/
//! ├── CURRICULUM.yaml      # domains and clusters
//! ├── lesson-01.yaml       # one primary concept plus its exercises
//! └── lesson-02.yaml
//! ```
//!
//! Every document may carry any of the top-level keys `domains`, `clusters`,
//! `concepts` and `exercises`. Lesson documents are discovered by glob and
//! read in lexicographic order so results are reproducible.
//!
//! # Usage
//!
//! ```no_run
//! use curriculum::content::ContentStore;
//! use curriculum::ContentConfig;
//!
//! let store = ContentStore::new(&ContentConfig::new("lessons")).unwrap();
//! let graph = store.graph();
//! for concept in graph.concepts_by_cluster("queries") {
//!     println!("{}: {}", concept.id, concept.name);
//! }
//! ```

mod graph;
mod loader;
mod model;
mod pattern;
mod store;

pub use graph::{ContentGraph, DanglingReference, DocumentInfo, DuplicateId, GraphSummary};
pub use loader::{ContentDocument, DocumentLoader, lesson_id_of, parse_document};
pub use model::{
    Cluster, Concept, Domain, Entity, EntityKind, EntityRef, Exercise, GENERAL_HINT, Hint, Record,
    Reference,
};
pub use pattern::LessonPattern;
pub use store::{ContentStore, ReloadOutcome};
