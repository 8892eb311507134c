use std::fmt;

use crate::severity::Severity;

/// One diagnostic captured from a unit of work.
///
/// Records are created when the diagnostic is emitted and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    file: Option<String>,
    line: Option<u32>,
}

impl Diagnostic {
    /// Creates a diagnostic without a source location.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    /// Attaches the source location the diagnostic was emitted from.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Returns the severity flag.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source file, if known.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the source line, if known.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{} ({}:{})", self.message, file, line),
            (Some(file), None) => write!(f, "{} ({})", self.message, file),
            _ => f.write_str(&self.message),
        }
    }
}
