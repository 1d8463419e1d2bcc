//! Configuration for content loading.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CurriculumError;

/// Default directory holding content documents.
pub const DEFAULT_CONTENT_DIR: &str = "lessons";
/// Default name of the document holding domains and clusters.
pub const DEFAULT_CURRICULUM_DOCUMENT: &str = "CURRICULUM.yaml";
/// Default lesson selection.
pub const DEFAULT_LESSON_PATTERN: &str = "*.yaml";

/// When the content graph is rebuilt from disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Rebuild on every read. Edits on disk are visible immediately.
    #[default]
    Rebuild,
    /// Build on first use and keep the snapshot until an explicit reload.
    Cached,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::Rebuild => f.write_str("rebuild"),
            CachePolicy::Cached => f.write_str("cached"),
        }
    }
}

impl FromStr for CachePolicy {
    type Err = CurriculumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rebuild" | "always" | "none" => Ok(CachePolicy::Rebuild),
            "cached" | "cache" | "process" => Ok(CachePolicy::Cached),
            other => Err(CurriculumError::Config(format!(
                "unknown cache policy '{}' (expected 'rebuild' or 'cached')",
                other
            ))),
        }
    }
}

/// Where content lives and how it is cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding all content documents.
    pub content_dir: PathBuf,
    /// Document contributing domains and clusters, relative to `content_dir`.
    pub curriculum_document: String,
    /// Glob selecting lesson documents inside `content_dir`.
    pub lesson_pattern: String,
    pub cache_policy: CachePolicy,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            curriculum_document: DEFAULT_CURRICULUM_DOCUMENT.to_string(),
            lesson_pattern: DEFAULT_LESSON_PATTERN.to_string(),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl ContentConfig {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_curriculum_document(mut self, name: impl Into<String>) -> Self {
        self.curriculum_document = name.into();
        self
    }

    pub fn with_lesson_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.lesson_pattern = pattern.into();
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }
}
