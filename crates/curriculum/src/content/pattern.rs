//! Glob-style selection of lesson documents.

use regex::Regex;

use crate::error::{CurriculumError, Result};

/// A compiled file-name pattern supporting `*` and `?` wildcards.
///
/// Patterns match whole file names, never paths: `*` does not cross `/`.
#[derive(Debug, Clone)]
pub struct LessonPattern {
    pattern: String,
    regex: Regex,
}

impl LessonPattern {
    /// Compile a glob pattern such as `lesson-*.yaml`.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(CurriculumError::Config(
                "lesson pattern must not be empty".to_string(),
            ));
        }

        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => source.push_str("[^/]*"),
                '?' => source.push_str("[^/]"),
                other => source.push_str(&regex::escape(&other.to_string())),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| CurriculumError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;

        Ok(Self { pattern, regex })
    }

    /// Whether a file name is selected by this pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_any_run() {
        let p = LessonPattern::new("lesson-*.yaml").unwrap();
        assert!(p.matches("lesson-01.yaml"));
        assert!(p.matches("lesson-.yaml"));
        assert!(!p.matches("lesson-01.yml"));
        assert!(!p.matches("intro-lesson-01.yaml"));
    }

    #[test]
    fn test_question_mark_and_escaping() {
        let p = LessonPattern::new("l?.yaml").unwrap();
        assert!(p.matches("l1.yaml"));
        assert!(!p.matches("l12.yaml"));
        // The dot is literal
        assert!(!p.matches("l1xyaml"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(LessonPattern::new("  ").is_err());
    }
}
