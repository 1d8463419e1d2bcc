//! Snapshot ownership and reload policy.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::config::{CachePolicy, ContentConfig};
use crate::error::Result;

use super::graph::ContentGraph;
use super::loader::DocumentLoader;
use super::pattern::LessonPattern;

/// Outcome of an explicit reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub revision: String,
    /// Whether the revision differs from the snapshot it replaced.
    pub changed: bool,
}

/// Owns the current [`ContentGraph`] snapshot.
///
/// Readers receive an `Arc` to a complete graph. New snapshots are built
/// without holding the lock and installed with a single pointer swap, so a
/// half-built graph is never visible.
#[derive(Debug)]
pub struct ContentStore {
    loader: DocumentLoader,
    curriculum_document: String,
    lesson_pattern: LessonPattern,
    policy: CachePolicy,
    snapshot: RwLock<Option<Arc<ContentGraph>>>,
}

impl ContentStore {
    pub fn new(config: &ContentConfig) -> Result<Self> {
        Ok(Self {
            loader: DocumentLoader::new(&config.content_dir),
            curriculum_document: config.curriculum_document.clone(),
            lesson_pattern: LessonPattern::new(&config.lesson_pattern)?,
            policy: config.cache_policy,
            snapshot: RwLock::new(None),
        })
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Read every document and assemble a fresh graph. Does not install it.
    pub fn build(&self) -> ContentGraph {
        let curriculum = self.loader.load_document(&self.curriculum_document);
        let lessons = self
            .loader
            .load_lessons(&self.lesson_pattern, &self.curriculum_document);
        ContentGraph::build(curriculum, lessons)
    }

    /// The graph to answer a request with, according to the cache policy.
    pub fn graph(&self) -> Arc<ContentGraph> {
        match self.policy {
            CachePolicy::Rebuild => self.install(Arc::new(self.build())).0,
            CachePolicy::Cached => {
                if let Some(graph) = self.current() {
                    return graph;
                }
                // Hold the write lock across the build so concurrent first
                // callers wait for one load instead of racing.
                let mut slot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
                if let Some(graph) = slot.as_ref() {
                    return Arc::clone(graph);
                }
                let graph = Arc::new(self.build());
                info!(revision = graph.revision(), "content loaded");
                *slot = Some(Arc::clone(&graph));
                graph
            }
        }
    }

    /// The installed snapshot, if any, without triggering a load.
    pub fn current(&self) -> Option<Arc<ContentGraph>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone)
    }

    /// Rebuild from disk and replace the snapshot.
    pub fn reload(&self) -> ReloadOutcome {
        let graph = Arc::new(self.build());
        let (graph, previous) = self.install(graph);
        let changed = previous.is_none_or(|p| p.revision() != graph.revision());
        info!(revision = graph.revision(), changed, "content reloaded");
        ReloadOutcome {
            revision: graph.revision().to_string(),
            changed,
        }
    }

    fn install(&self, graph: Arc<ContentGraph>) -> (Arc<ContentGraph>, Option<Arc<ContentGraph>>) {
        let mut slot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        let previous = slot.replace(Arc::clone(&graph));
        (graph, previous)
    }
}
