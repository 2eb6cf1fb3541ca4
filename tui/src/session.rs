/// Display path the terminal starts in.
pub const HOME_PATH: &str = "~";

/// Per-terminal state that only the remote executor can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    path: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            path: HOME_PATH.to_string(),
        }
    }
}

impl SessionState {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Apply the `new_path` of an executor response. `None` leaves the path
    /// unchanged. Returns whether the displayed path changed.
    pub fn apply_new_path(&mut self, new_path: Option<&str>) -> bool {
        match new_path {
            Some(path) if path != self.path => {
                tracing::debug!(from = %self.path, to = %path, "working directory changed");
                self.path = path.to_string();
                true
            }
            _ => false,
        }
    }
}
