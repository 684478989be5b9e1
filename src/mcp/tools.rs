//! Tool registry and typed tool arguments.
//!
//! `tools/call` carries an untyped `arguments` object. [`ToolArguments::decode`]
//! turns it into one of the known argument shapes and validates it; only a
//! fully validated value is ever applied to the store, so malformed input
//! never mutates anything.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::DispatchError;
use crate::metadata::{LineRange, MetadataStore, TestReference, TestSuggestion};

/// Name of the tool that records which tests cover a source file.
pub const SUBMIT_TEST_METADATA: &str = "submit-test-metadata";

/// Name of the tool that records missing-test suggestions.
pub const SUGGEST_MISSING_TESTS: &str = "suggest-missing-tests";

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Creates a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }
}

/// Schema fragment for a `{start, end}` line range.
fn line_range_schema(description: &str, required: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "description": description,
        "properties": {
            "start": {"type": "integer", "minimum": 0, "description": "Starting line number (1-indexed)"},
            "end": {"type": "integer", "minimum": 0, "description": "Ending line number (1-indexed, inclusive)"}
        }
    });
    if required {
        schema["required"] = json!(["start", "end"]);
    }
    schema
}

/// Returns the static descriptors of every registered tool.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SUBMIT_TEST_METADATA.to_string(),
            description: Some(
                "Submit metadata about the tests covering a source file. Registers which \
                 tests exercise which lines of the source file, together with where the \
                 test code, its input data and its expected output live in the test file. \
                 Tests are merged by testFile + testName; resubmitting a test replaces it."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sourceFile": {
                        "type": "string",
                        "description": "Path to the source file being tested"
                    },
                    "tests": {
                        "type": "array",
                        "description": "Tests covering this source file",
                        "items": {
                            "type": "object",
                            "properties": {
                                "testFile": {
                                    "type": "string",
                                    "description": "Path to the test file"
                                },
                                "testName": {
                                    "type": "string",
                                    "description": "Name of the test function or case"
                                },
                                "comment": {
                                    "type": "string",
                                    "description": "Short note on what the test checks"
                                },
                                "lineRange": line_range_schema("Lines of the test code, in the test file", true),
                                "coveredLines": line_range_schema("Lines of the source file this test exercises", true),
                                "inputLines": line_range_schema("Lines of the test file holding the input data", false),
                                "outputLines": line_range_schema("Lines of the test file holding the expected output", false)
                            },
                            "required": ["testFile", "testName", "comment", "lineRange", "coveredLines"]
                        }
                    }
                },
                "required": ["sourceFile", "tests"]
            }),
        },
        ToolDefinition {
            name: SUGGEST_MISSING_TESTS.to_string(),
            description: Some(
                "Suggest tests that are missing for a source file. Each suggestion names the \
                 uncovered lines, explains why they need a test and proposes a test skeleton. \
                 Suggestions are merged by suggestedName."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sourceFile": {
                        "type": "string",
                        "description": "Path to the source file lacking coverage"
                    },
                    "suggestions": {
                        "type": "array",
                        "description": "Missing tests for this source file",
                        "items": {
                            "type": "object",
                            "properties": {
                                "targetLines": line_range_schema("Lines of the source file that need coverage", true),
                                "reason": {
                                    "type": "string",
                                    "description": "Why these lines need a test"
                                },
                                "suggestedName": {
                                    "type": "string",
                                    "description": "Proposed name for the new test"
                                },
                                "testSkeleton": {
                                    "type": "string",
                                    "description": "Starter code for the test"
                                },
                                "priority": {
                                    "type": "string",
                                    "enum": ["high", "medium", "low"],
                                    "description": "How urgently the test is needed"
                                }
                            },
                            "required": ["targetLines", "reason", "suggestedName", "testSkeleton", "priority"]
                        }
                    }
                },
                "required": ["sourceFile", "suggestions"]
            }),
        },
    ]
}

/// One test as submitted through `submit-test-metadata`.
///
/// Stricter than [`TestReference`]: the comment and both mandatory ranges
/// must be present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTest {
    /// Path of the file holding the test.
    pub test_file: String,
    /// Test function name; unique per `test_file`.
    pub test_name: String,
    /// What the test checks.
    pub comment: String,
    /// Span of the test code in `test_file`.
    pub line_range: LineRange,
    /// Span of the source file the test exercises.
    pub covered_lines: LineRange,
    /// Span of the input data in `test_file`.
    #[serde(default)]
    pub input_lines: Option<LineRange>,
    /// Span of the expected output in `test_file`.
    #[serde(default)]
    pub output_lines: Option<LineRange>,
}

impl SubmittedTest {
    fn validate(&self, index: usize) -> Result<(), String> {
        if self.test_file.trim().is_empty() {
            return Err(format!("tests[{index}].testFile must not be empty"));
        }
        if self.test_name.trim().is_empty() {
            return Err(format!("tests[{index}].testName must not be empty"));
        }
        self.line_range
            .validate(&format!("tests[{index}].lineRange"))?;
        self.covered_lines
            .validate(&format!("tests[{index}].coveredLines"))?;
        if let Some(range) = self.input_lines {
            range.validate(&format!("tests[{index}].inputLines"))?;
        }
        if let Some(range) = self.output_lines {
            range.validate(&format!("tests[{index}].outputLines"))?;
        }
        Ok(())
    }
}

impl From<SubmittedTest> for TestReference {
    fn from(test: SubmittedTest) -> Self {
        Self {
            test_file: test.test_file,
            test_name: test.test_name,
            comment: Some(test.comment),
            line_range: test.line_range,
            covered_lines: test.covered_lines,
            input_lines: test.input_lines.filter(|r| !r.is_unspecified()),
            output_lines: test.output_lines.filter(|r| !r.is_unspecified()),
        }
    }
}

/// Arguments of `submit-test-metadata`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestMetadataArgs {
    /// Source file the tests cover, used verbatim as the store key.
    pub source_file: String,
    /// Tests to merge into the file's metadata.
    pub tests: Vec<SubmittedTest>,
}

/// Arguments of `suggest-missing-tests`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestMissingTestsArgs {
    /// Source file needing tests, used verbatim as the store key.
    pub source_file: String,
    /// Suggestions to merge into the file's metadata.
    pub suggestions: Vec<TestSuggestion>,
}

/// Decoded and validated arguments of a known tool.
#[derive(Debug, Clone)]
pub enum ToolArguments {
    /// `submit-test-metadata`.
    SubmitTestMetadata(SubmitTestMetadataArgs),
    /// `suggest-missing-tests`.
    SuggestMissingTests(SuggestMissingTestsArgs),
}

impl ToolArguments {
    /// Decodes `arguments` for tool `name` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownTool`] for an unregistered name and
    /// [`DispatchError::InvalidParams`] if the arguments do not match the
    /// tool's schema.
    pub fn decode(name: &str, arguments: Value) -> Result<Self, DispatchError> {
        let args = match name {
            SUBMIT_TEST_METADATA => Self::SubmitTestMetadata(decode_shape(name, arguments)?),
            SUGGEST_MISSING_TESTS => Self::SuggestMissingTests(decode_shape(name, arguments)?),
            _ => return Err(DispatchError::UnknownTool(name.to_string())),
        };
        args.validate().map_err(DispatchError::InvalidParams)?;
        Ok(args)
    }

    /// Returns the source file the arguments refer to.
    #[must_use]
    pub fn source_file(&self) -> &str {
        match self {
            Self::SubmitTestMetadata(args) => &args.source_file,
            Self::SuggestMissingTests(args) => &args.source_file,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.source_file().trim().is_empty() {
            return Err("sourceFile must not be empty".to_string());
        }

        match self {
            Self::SubmitTestMetadata(args) => {
                for (index, test) in args.tests.iter().enumerate() {
                    test.validate(index)?;
                }
            }
            Self::SuggestMissingTests(args) => {
                for (index, suggestion) in args.suggestions.iter().enumerate() {
                    if suggestion.suggested_name.trim().is_empty() {
                        return Err(format!(
                            "suggestions[{index}].suggestedName must not be empty"
                        ));
                    }
                    suggestion
                        .target_lines
                        .validate(&format!("suggestions[{index}].targetLines"))?;
                }
            }
        }
        Ok(())
    }

    /// Applies the arguments to `store` and builds the confirmation text.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Store`] if the change could not be persisted.
    pub fn apply(self, store: &MetadataStore) -> Result<ToolCallResult, DispatchError> {
        match self {
            Self::SubmitTestMetadata(args) => {
                let count = args.tests.len();
                let tests = args.tests.into_iter().map(TestReference::from).collect();
                store.add_test_metadata(&args.source_file, tests)?;
                Ok(ToolCallResult::text(format!(
                    "Successfully stored test metadata for {} ({count} tests)",
                    args.source_file
                )))
            }
            Self::SuggestMissingTests(args) => {
                let count = args.suggestions.len();
                for suggestion in &args.suggestions {
                    tracing::debug!(
                        name = %suggestion.suggested_name,
                        priority = %suggestion.priority,
                        "Test suggestion"
                    );
                }
                store.add_suggestions(&args.source_file, args.suggestions)?;
                Ok(ToolCallResult::text(format!(
                    "Successfully stored {count} test suggestions for {}",
                    args.source_file
                )))
            }
        }
    }
}

fn decode_shape<T: serde::de::DeserializeOwned>(
    name: &str,
    arguments: Value,
) -> Result<T, DispatchError> {
    serde_json::from_value(arguments)
        .map_err(|e| DispatchError::InvalidParams(format!("{name} arguments: {e}")))
}
