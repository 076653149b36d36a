use serde::{Deserialize, Serialize};

/// How serious a diagnostic is. Nothing in the engine aborts on a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// A one-line diagnostic surfaced on the project snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file_path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(file_path: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file_path: file_path.map(String::from),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file_path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => f.write_str(&self.message),
        }
    }
}
