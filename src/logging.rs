//! `tracing` output for the interception machinery.
//!
//! Boundary bookkeeping is logged at `debug`/`trace`. Diagnostics nobody
//! handled are the default report: warning-class severities at `warn`,
//! everything else at `info`.

use crate::{diagnostic::Diagnostic, severity::SeverityMask};

pub(crate) fn installed(handler: u64, mask: SeverityMask) {
    tracing::debug!(handler, mask = %mask, "diagnostic handler installed");
}

pub(crate) fn released(handler: u64) {
    tracing::debug!(handler, "diagnostic handler released");
}

pub(crate) fn captured(mask: SeverityMask, diagnostic: &Diagnostic) {
    tracing::trace!(
        mask = %mask,
        severity = %diagnostic.severity(),
        "captured diagnostic: {}",
        diagnostic.message()
    );
}

/// Reports a diagnostic that no handler took care of.
pub(crate) fn unhandled(diagnostic: &Diagnostic) {
    let severity = diagnostic.severity();
    let file = diagnostic.file().unwrap_or("<unknown>");
    let line = diagnostic.line().unwrap_or(0);

    if severity.is_warning() {
        tracing::warn!(severity = %severity, file, line, "{}", diagnostic.message());
    } else {
        tracing::info!(severity = %severity, file, line, "{}", diagnostic.message());
    }
}
