/// Summary produced when a terminal session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppExitInfo {
    /// Number of non-empty commands submitted during the session.
    pub commands_submitted: usize,
    /// Working directory shown by the last prompt.
    pub final_path: String,
    pub exit_reason: ExitReason,
}

/// Reason why the terminal session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Ctrl+C, or Ctrl+D on an empty prompt.
    UserRequested,
    /// The terminal input stream ended.
    InputClosed,
}
