//! Curriculum: content resolution for a hierarchical learning curriculum.
//!
//! Content is authored as YAML documents (domains → clusters → concepts →
//! exercises) and assembled into an immutable, id-indexed graph that answers
//! a small fixed set of read queries.
//!
//! # Core Principles
//!
//! - **Read-only**: content is never mutated at request time
//! - **Total**: missing or malformed documents shrink results, they never fail a query
//! - **Atomic snapshots**: a reload swaps in a complete graph or nothing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use curriculum::{ContentConfig, ContentStore, QueryService};
//!
//! let store = ContentStore::new(&ContentConfig::new("lessons")).unwrap();
//! let service = QueryService::new(Arc::new(store));
//!
//! for concept in service.concepts_by_cluster("queries").unwrap() {
//!     println!("{}: {}", concept.id, concept.objective);
//! }
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod interaction;
pub mod query;

pub use config::{CachePolicy, ContentConfig};
pub use content::{
    Cluster, Concept, ContentGraph, ContentStore, Domain, Entity, EntityKind, Exercise, Hint,
};
pub use error::{CurriculumError, Result};
pub use interaction::{InteractionLogConfig, InteractionLogger, InteractionRecord};
pub use query::{Query, QueryOutput, QueryService};
