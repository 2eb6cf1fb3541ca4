use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// What a transcript line represents. Drives styling only; the text of a
/// line is never reinterpreted based on its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LineKind {
    /// `user@host:path$ ` followed by whatever was in the live region when it retired.
    Prompt,
    /// The submitted command, echoed with the path it was submitted from.
    CommandEcho,
    Output,
    Error,
}
