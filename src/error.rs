use std::fmt;

use crate::collection::DiagnosticCollection;

/// Error raised while configuring a [`Cloak`](crate::Cloak).
///
/// Configuration errors surface from construction only; once a `Cloak`
/// exists its configuration is known to be valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns what was wrong with the configuration.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// The kind of configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A raw policy value outside the recognized set
    InvalidPolicy(i64),
    /// A policy name that matches no policy
    UnknownPolicy(String),
    /// A severity name that matches no known flag
    UnknownSeverity(String),
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::InvalidPolicy(raw) => write!(f, "invalid policy {}", raw),
            ConfigErrorKind::UnknownPolicy(name) => write!(f, "unknown policy '{}'", name),
            ConfigErrorKind::UnknownSeverity(name) => write!(f, "unknown severity '{}'", name),
        }
    }
}

/// Failure returned by a cloaked invocation.
///
/// The work's own error always wins over policy resolution: if the work
/// fails, the result is [`Failure::Work`] even when diagnostics were
/// captured along the way.
#[derive(Debug)]
pub enum Failure<E> {
    /// The wrapped work failed; the error is passed through untouched.
    Work(E),
    /// The work succeeded but emitted diagnostics the policy turns into a failure.
    Diagnostics(DiagnosticCollection),
}

impl<E> Failure<E> {
    /// Returns the captured diagnostics if this failure was raised by policy.
    pub fn diagnostics(&self) -> Option<&DiagnosticCollection> {
        match self {
            Failure::Diagnostics(collection) => Some(collection),
            Failure::Work(_) => None,
        }
    }

    /// Returns the work's error if the work itself failed.
    pub fn into_work(self) -> Option<E> {
        match self {
            Failure::Work(err) => Some(err),
            Failure::Diagnostics(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Work(err) => fmt::Display::fmt(err, f),
            Failure::Diagnostics(collection) => fmt::Display::fmt(collection, f),
        }
    }
}

// Transparent: the chain continues with the inner error's own source.
impl<E> std::error::Error for Failure<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Work(err) => err.source(),
            Failure::Diagnostics(collection) => std::error::Error::source(collection),
        }
    }
}
