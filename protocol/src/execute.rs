//! Request/response pair for the remote command executor.
//!
//! The executor is a single JSON-over-HTTP call: the terminal posts one
//! [`ExecuteCommandRequest`] and receives exactly one [`ExecuteCommandResponse`].

use serde::Deserialize;
use serde::Serialize;

/// Body posted to the executor for every non-empty submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCommandRequest {
    /// The raw command line exactly as typed.
    pub command: String,
}

impl ExecuteCommandRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Executor reply. Every field is optional; a missing field (or `null`)
/// means "no content / no change" for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCommandResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Working directory to display in subsequent prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
}

impl ExecuteCommandResponse {
    /// Command output, if present and non-empty.
    pub fn output_text(&self) -> Option<&str> {
        non_empty(self.output.as_deref())
    }

    /// Application-level error, if present and non-empty.
    pub fn error_text(&self) -> Option<&str> {
        non_empty(self.error.as_deref())
    }

    /// New working directory, if present and non-empty.
    ///
    /// Executors that always echo the current path back are fine: an
    /// unchanged path simply overwrites itself.
    pub fn new_path_text(&self) -> Option<&str> {
        non_empty(self.new_path.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
