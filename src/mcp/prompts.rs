//! Prompt registry.
//!
//! A single prompt is registered. It walks the agent through reviewing the
//! tests of one function and reporting them with `submit-test-metadata`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::mcp::tools::SUBMIT_TEST_METADATA;

/// Name of the test-review prompt.
pub const CODEBASE_TESTS_REVIEW: &str = "codebase-tests-review";

/// A prompt definition for the prompts/list response.
#[derive(Debug, Clone, Serialize)]
pub struct PromptDefinition {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments the prompt accepts.
    pub arguments: Vec<PromptArgument>,
}

/// One argument of a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// Parameters for prompts/get request.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptGetParams {
    /// Name of the prompt.
    pub name: String,
    /// Argument values, all strings.
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// Content of a prompt message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// One message of a rendered prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    /// Speaker role, always `user` here.
    pub role: String,
    /// Message body.
    pub content: PromptContent,
}

/// Result of prompts/get.
#[derive(Debug, Clone, Serialize)]
pub struct PromptGetResult {
    /// Description of the rendered prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered messages.
    pub messages: Vec<PromptMessage>,
}

/// Returns the static descriptors of every registered prompt.
#[must_use]
pub fn prompt_definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: CODEBASE_TESTS_REVIEW.to_string(),
        description: Some(format!(
            "Analyse a function and submit metadata about its tests using the \
             {SUBMIT_TEST_METADATA} tool"
        )),
        arguments: vec![
            PromptArgument {
                name: "functionName".to_string(),
                description: Some("Name of the function to analyse".to_string()),
                required: true,
            },
            PromptArgument {
                name: "filePath".to_string(),
                description: Some("Path to the file containing the function".to_string()),
                required: true,
            },
        ],
    }]
}

/// Renders prompt `name` with `arguments`.
///
/// # Errors
///
/// Returns [`DispatchError::UnknownPrompt`] for an unregistered name and
/// [`DispatchError::MissingArgument`] if a required argument is absent or
/// empty.
pub fn render_prompt(
    name: &str,
    arguments: &HashMap<String, String>,
) -> Result<PromptGetResult, DispatchError> {
    if name != CODEBASE_TESTS_REVIEW {
        return Err(DispatchError::UnknownPrompt(name.to_string()));
    }

    let function_name = required_argument(arguments, "functionName")?;
    let file_path = required_argument(arguments, "filePath")?;

    Ok(PromptGetResult {
        description: Some(format!("Test review of {function_name} in {file_path}")),
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content: PromptContent::Text {
                text: tests_review_text(function_name, file_path),
            },
        }],
    })
}

fn required_argument<'a>(
    arguments: &'a HashMap<String, String>,
    key: &'static str,
) -> Result<&'a str, DispatchError> {
    arguments
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(DispatchError::MissingArgument(key))
}

fn tests_review_text(function_name: &str, file_path: &str) -> String {
    format!(
        r#"Review the tests of the **{function_name}** function in **{file_path}**.

1. Read the implementation of `{function_name}`.
2. Find every test that exercises it.
3. For each test, work out:
   * which lines of `{file_path}` the test exercises,
   * where the test code sits in its test file,
   * where its input data and expected result sit in its test file.

Summarise each test as one row:

| Test file | Test name | Test lines | Input lines | Expected-result lines |

Then record the tests with the **{SUBMIT_TEST_METADATA}** tool:

{{
  "sourceFile": "{file_path}",
  "tests": [
    {{
      "testFile": "path/to/test_file",
      "testName": "test_name",
      "comment": "what the test checks",
      "lineRange": {{"start": 10, "end": 25}},
      "coveredLines": {{"start": 40, "end": 52}},
      "inputLines": {{"start": 12, "end": 15}},
      "outputLines": {{"start": 20, "end": 22}}
    }}
  ]
}}

Field meanings:
* `lineRange`: lines of the test code, counted in the test file.
* `coveredLines`: lines of `{file_path}` that the test exercises.
* `inputLines` / `outputLines` (optional): lines of the test file holding the input data and the expected result.

All line numbers are 1-indexed and inclusive. Resubmitting a test with the same testFile and testName replaces it."#
    )
}
