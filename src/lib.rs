//! Scoped interception of non-fatal diagnostics.
//!
//! Code reports warnings, notices and deprecations on a side channel with
//! [`emit`] instead of through its return value. A [`Cloak`] wraps a unit of
//! work and, for the duration of each call:
//! - **Intercepts** the diagnostics the work emits, filtered by severity
//! - **Collects** them in emission order into a [`DiagnosticCollection`]
//! - **Resolves** them by policy: returned alongside the result, or turned
//!   into a failure
//!
//! # Core Types
//!
//! - [`Cloak`]: The guard wrapping a unit of work
//! - [`Policy`]: Silent, throw, or follow the process-wide [`ThrowSwitch`]
//! - [`SeverityMask`]: Which [`Severity`] flags a cloak intercepts
//! - [`DiagnosticCollection`]: The captured [`Diagnostic`] records, usable as an error
//! - [`CloakBuilder`]: Construction from raw integers and names
//!
//! # Examples
//!
//! ```
//! use cloak::{Cloak, Failure, Policy, Severity, emit};
//!
//! let mut touch = Cloak::warning(
//!     |path: &str| -> Result<(), std::io::Error> {
//!         emit(Severity::WARNING, format!("touch(): unable to create {}", path));
//!         Ok(())
//!     },
//!     Policy::Throw,
//! );
//!
//! match touch.invoke("/nonexistent/file") {
//!     Err(Failure::Diagnostics(errors)) => {
//!         assert_eq!(errors.to_string(), "touch(): unable to create /nonexistent/file");
//!     }
//!     _ => unreachable!(),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ambient;
mod builder;
mod cloak;
mod collection;
mod diagnostic;
mod error;
mod logging;
mod policy;
mod severity;

pub use ambient::{DiagnosticHandler, HandlerScope, ReportingScope, emit};
pub use builder::CloakBuilder;
pub use cloak::Cloak;
pub use collection::DiagnosticCollection;
pub use diagnostic::Diagnostic;
pub use error::{ConfigError, ConfigErrorKind, Failure};
pub use policy::{Policy, PolicySelector, ThrowSwitch};
pub use severity::{LevelSelector, Severity, SeverityMask};
