//! Ordered storage for captured diagnostics.

use std::fmt;

use crate::diagnostic::Diagnostic;

/// The diagnostics captured during one invocation, oldest first.
///
/// A collection doubles as an error: when a policy turns captured
/// diagnostics into a failure, the collection itself is returned, and its
/// message is the message of the earliest diagnostic.
///
/// # Example
///
/// ```
/// use cloak::{Cloak, Policy, Severity, emit};
///
/// let mut cloak = Cloak::warning(
///     |_: ()| {
///         emit(Severity::WARNING, "first");
///         emit(Severity::WARNING, "second");
///     },
///     Policy::Throw,
/// );
///
/// let err = cloak.run(()).unwrap_err();
/// assert_eq!(err.to_string(), "first");
/// assert_eq!(err.len(), 2);
/// assert_eq!(err.last().map(|d| d.message()), Some("second"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticCollection {
    records: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a diagnostic as the most recent one.
    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if at least one diagnostic was captured.
    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Returns the number of captured diagnostics.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns the earliest diagnostic.
    pub fn first(&self) -> Option<&Diagnostic> {
        self.records.first()
    }

    /// Returns the most recent diagnostic.
    pub fn last(&self) -> Option<&Diagnostic> {
        self.records.last()
    }

    /// Returns the diagnostic at `index`, counting from the earliest.
    pub fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.records.get(index)
    }

    /// Iterates the diagnostics in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.records.iter()
    }

    /// Returns a snapshot of the diagnostics in emission order.
    pub fn to_vec(&self) -> Vec<Diagnostic> {
        self.records.clone()
    }
}

impl fmt::Display for DiagnosticCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(first) => f.write_str(first.message()),
            None => Ok(()),
        }
    }
}

impl std::error::Error for DiagnosticCollection {}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
