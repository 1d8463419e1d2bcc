//! Reads YAML content documents into typed records.
//!
//! The loader never fails its caller: a missing or malformed document
//! contributes nothing and is reported through `tracing`. No caching happens
//! here; every call re-reads the file system.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{CurriculumError, Result};

use super::model::{Cluster, Concept, Domain, Exercise, Record};
use super::pattern::LessonPattern;

/// Typed records parsed from a single document.
#[derive(Debug, Clone, Default)]
pub struct ContentDocument {
    /// File name relative to the content directory.
    pub name: String,
    /// File stem, used to address lesson documents.
    pub lesson_id: String,
    /// SHA-256 of the raw bytes.
    pub digest: String,
    pub domains: Vec<Domain>,
    pub clusters: Vec<Cluster>,
    pub concepts: Vec<Concept>,
    pub exercises: Vec<Exercise>,
    /// Records that were present but failed to deserialize or validate.
    pub rejected: usize,
}

impl ContentDocument {
    /// Total number of accepted records.
    pub fn record_count(&self) -> usize {
        self.domains.len() + self.clusters.len() + self.concepts.len() + self.exercises.len()
    }
}

/// Loads content documents from a directory.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    content_dir: PathBuf,
}

impl DocumentLoader {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Load a single named document, or `None` if it is missing or malformed.
    pub fn load_document(&self, name: &str) -> Option<ContentDocument> {
        match self.try_load_document(name) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(document = name, error = %e, "skipping content document");
                None
            }
        }
    }

    /// Load a single named document, reporting why it could not be used.
    pub fn try_load_document(&self, name: &str) -> Result<ContentDocument> {
        let path = self.content_dir.join(name);
        let bytes = fs::read(&path).map_err(|source| CurriculumError::SourceUnavailable {
            path: path.clone(),
            source,
        })?;
        parse_document(name, &bytes).map_err(|e| match e {
            CurriculumError::SourceMalformed { message, .. } => {
                CurriculumError::SourceMalformed { path, message }
            }
            other => other,
        })
    }

    /// File names in the content directory selected by `pattern`, sorted
    /// lexicographically. `exclude` is never returned.
    pub fn discover_lessons(&self, pattern: &LessonPattern, exclude: &str) -> Vec<String> {
        let entries = match fs::read_dir(&self.content_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.content_dir.display(),
                    error = %e,
                    "content directory unavailable"
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name != exclude && pattern.matches(name))
            .collect();

        names.sort();
        names
    }

    /// Load every lesson document selected by `pattern`, in discovery order.
    pub fn load_lessons(&self, pattern: &LessonPattern, exclude: &str) -> Vec<ContentDocument> {
        self.discover_lessons(pattern, exclude)
            .iter()
            .filter_map(|name| self.load_document(name))
            .collect()
    }
}

/// Parse raw document bytes into typed records.
///
/// An empty document is valid and yields no records. A document whose root is
/// not a mapping is malformed.
pub fn parse_document(name: &str, bytes: &[u8]) -> Result<ContentDocument> {
    let malformed = |message: String| CurriculumError::SourceMalformed {
        path: PathBuf::from(name),
        message,
    };

    let root: Value = serde_yaml::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    let map = match root {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => return Err(malformed("document root must be a mapping".to_string())),
    };

    let mut doc = ContentDocument {
        name: name.to_string(),
        lesson_id: lesson_id_of(name).to_string(),
        digest: format!("sha256:{:x}", Sha256::digest(bytes)),
        ..Default::default()
    };

    doc.domains = extract(&map, name, &mut doc.rejected);
    doc.clusters = extract(&map, name, &mut doc.rejected);
    doc.concepts = extract(&map, name, &mut doc.rejected);
    doc.exercises = extract(&map, name, &mut doc.rejected);

    debug!(
        document = name,
        records = doc.record_count(),
        rejected = doc.rejected,
        "parsed content document"
    );
    Ok(doc)
}

/// Lesson id for a document name: the file name without its extension.
pub fn lesson_id_of(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn extract<T>(map: &Mapping, document: &str, rejected: &mut usize) -> Vec<T>
where
    T: Record + DeserializeOwned,
{
    let key = T::KIND.document_key();
    let items = match map.get(key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Sequence(items)) => items,
        Some(_) => {
            warn!(document, key, "expected a list, ignoring key");
            *rejected += 1;
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let record = match serde_yaml::from_value::<T>(item.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!(document, kind = %T::KIND, position, error = %e, "rejecting record");
                *rejected += 1;
                continue;
            }
        };
        if let Err(reason) = record.validate() {
            warn!(document, kind = %T::KIND, position, reason = %reason, "rejecting record");
            *rejected += 1;
            continue;
        }
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_yield_no_records() {
        let doc = parse_document("lesson-01.yaml", b"title: nothing here\n").unwrap();
        assert_eq!(doc.record_count(), 0);
        assert_eq!(doc.rejected, 0);
        assert_eq!(doc.lesson_id, "lesson-01");
        assert!(doc.digest.starts_with("sha256:"));
    }

    #[test]
    fn test_empty_document_is_valid() {
        let doc = parse_document("empty.yaml", b"").unwrap();
        assert_eq!(doc.record_count(), 0);
    }

    #[test]
    fn test_non_mapping_root_is_malformed() {
        let err = parse_document("list.yaml", b"- a\n- b\n").unwrap_err();
        assert!(matches!(err, CurriculumError::SourceMalformed { .. }));
    }

    #[test]
    fn test_bad_record_does_not_drop_siblings() {
        let yaml = br#"
domains:
  - id: d1
    name: GraphQL
    inquiry: What is GraphQL?
  - id: d2
    inquiry: missing its name
clusters: "not a list"
"#;
        let doc = parse_document("CURRICULUM.yaml", yaml).unwrap();
        assert_eq!(doc.domains.len(), 1);
        assert_eq!(doc.domains[0].id, "d1");
        assert_eq!(doc.rejected, 2);
    }

    #[test]
    fn test_legacy_exercise_shape_is_accepted() {
        let yaml = br#"
exercises:
  - id: e1
    inquiry: Fetch a field
    objective: Write a selection
    difficulty: beginner
    solution: "{ a }"
    hints: [Use braces]
    conceptIds: [x1]
  - id: e2
    inquiry: Fetch two fields
    objective: Combine fields
    difficulty: "2"
    solution: "{ a b }"
"#;
        let doc = parse_document("lesson-01.yaml", yaml).unwrap();
        assert_eq!(doc.rejected, 0);
        assert_eq!(doc.exercises.len(), 2);
        assert_eq!(doc.exercises[0].difficulty, 1.0);
        assert_eq!(doc.exercises[0].solutions, vec!["{ a }".to_string()]);
        assert_eq!(doc.exercises[1].difficulty, 2.0);
    }

    #[test]
    fn test_lesson_id_of() {
        assert_eq!(lesson_id_of("lesson-02.yaml"), "lesson-02");
        assert_eq!(lesson_id_of("README"), "README");
    }
}
