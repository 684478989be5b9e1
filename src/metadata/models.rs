//! Metadata records attached to source files.
//!
//! Field names follow the wire schema shared by the tool-calling protocol,
//! the web UI and the persisted JSON document (camelCase).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A 1-indexed, inclusive span of lines.
///
/// `{0, 0}` means "unspecified".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line of the span (1-indexed).
    pub start: u32,
    /// Last line of the span (1-indexed, inclusive).
    pub end: u32,
}

impl LineRange {
    /// Creates a new line range.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns `true` for the `{0, 0}` placeholder.
    #[must_use]
    pub const fn is_unspecified(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    /// Checks the range is either unspecified or a well-ordered 1-indexed span.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem, prefixed by `field`.
    pub fn validate(&self, field: &str) -> Result<(), String> {
        if self.is_unspecified() {
            return Ok(());
        }
        if self.start == 0 || self.end == 0 {
            return Err(format!(
                "{field}: line numbers are 1-indexed (got start={}, end={})",
                self.start, self.end
            ));
        }
        if self.start > self.end {
            return Err(format!(
                "{field}: start ({}) must not exceed end ({})",
                self.start, self.end
            ));
        }
        Ok(())
    }
}

/// Links a source file to one test that exercises it.
///
/// The merge identity is `(test_file, test_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReference {
    /// Path to the file containing the test.
    pub test_file: String,
    /// Name of the test function or case.
    pub test_name: String,
    /// Free-text note about what the test checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Span of the test code inside `test_file`.
    #[serde(default)]
    pub line_range: LineRange,
    /// Span of the source file the test exercises.
    #[serde(default)]
    pub covered_lines: LineRange,
    /// Span of `test_file` holding the input data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_lines: Option<LineRange>,
    /// Span of `test_file` holding the expected output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_lines: Option<LineRange>,
}

impl TestReference {
    /// Returns the merge identity of this test.
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.test_file.clone(), self.test_name.clone())
    }
}

/// How urgently a suggested test should be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Returns the wire name of this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test that should exist but does not yet.
///
/// The merge identity is `suggested_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuggestion {
    /// Source span lacking coverage.
    pub target_lines: LineRange,
    /// Why the span needs a test.
    pub reason: String,
    /// Proposed test name.
    pub suggested_name: String,
    /// Starter code for the test.
    pub test_skeleton: String,
    /// Urgency.
    pub priority: Priority,
}

/// Caller-supplied part of a review comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    /// Line the comment is anchored to (1-indexed).
    pub line: u32,
    /// Comment body.
    pub content: String,
    /// Who wrote the comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Surrounding lines shown with the comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_lines: Option<LineRange>,
}

/// A review comment stored against a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Store-generated identifier. Never changes once assigned.
    pub id: String,
    /// Line the comment is anchored to (1-indexed).
    pub line: u32,
    /// Comment body.
    pub content: String,
    /// Who wrote the comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Surrounding lines shown with the comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_lines: Option<LineRange>,
    /// Whether the discussion is closed.
    #[serde(default)]
    pub resolved: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last content or resolved-flag change.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Builds a fresh comment with a new id and matching timestamps.
    #[must_use]
    pub fn create(new: NewComment) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            line: new.line,
            content: new.content,
            author: new.author,
            context_lines: new.context_lines,
            resolved: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advances `updated_at`, always moving strictly forward.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Everything known about one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Tests exercising the file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TestReference>,
    /// Missing-test suggestions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<TestSuggestion>,
    /// Review comments, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}
