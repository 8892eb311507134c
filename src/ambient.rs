//! The ambient diagnostic facility.
//!
//! Code under execution reports non-fatal diagnostics with [`emit`]. Each
//! thread owns one handler slot, organised as a stack: [`install`] pushes a
//! handler and returns a [`HandlerScope`] that pops it again when dropped,
//! so nested or sequential boundaries always restore the handler that was
//! active before them, including when the scope is left by unwinding.
//!
//! Only the innermost handler is consulted, and only for severities in the
//! mask it was installed with. Diagnostics it does not handle fall through
//! to the default reporter, which logs them through `tracing` if their
//! severity is currently enabled (see [`enabled`]). The enabled mask is
//! process-wide: every thread sees the same reporting configuration.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::{
    diagnostic::Diagnostic,
    logging,
    severity::{Severity, SeverityMask},
};

/// Receives diagnostics while installed on the ambient stack.
///
/// Returning `true` marks the diagnostic as handled; `false` lets the
/// default reporter see it.
pub trait DiagnosticHandler {
    /// Handles one diagnostic.
    fn handle(&mut self, diagnostic: &Diagnostic) -> bool;
}

impl<F> DiagnosticHandler for F
where
    F: FnMut(&Diagnostic) -> bool,
{
    fn handle(&mut self, diagnostic: &Diagnostic) -> bool {
        self(diagnostic)
    }
}

struct Installed {
    id: u64,
    mask: SeverityMask,
    // `None` while the handler is running.
    handler: Option<Box<dyn DiagnosticHandler>>,
}

struct State {
    handlers: Vec<Installed>,
    next_id: u64,
}

impl State {
    fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::new());
}

static ENABLED: AtomicU32 = AtomicU32::new(SeverityMask::ALL.bits());

/// Live reporting scopes, oldest first, with the mask each one replaced.
static REPORTING_SCOPES: Mutex<Vec<(u64, SeverityMask)>> = Mutex::new(Vec::new());

static NEXT_REPORTING_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Returns the severities the default reporter currently reports.
pub fn enabled() -> SeverityMask {
    SeverityMask::from_value(ENABLED.load(Ordering::SeqCst))
}

/// Replaces the enabled severities, returning the previous mask.
pub fn set_enabled(mask: SeverityMask) -> SeverityMask {
    SeverityMask::from_value(ENABLED.swap(mask.bits(), Ordering::SeqCst))
}

/// Enables `mask` until the returned scope is dropped.
///
/// Scopes may be dropped in any order; once all of them are gone the mask
/// that was enabled before the oldest one is back in effect.
///
/// # Examples
///
/// ```
/// use cloak::{Severity, SeverityMask, ambient};
///
/// let before = ambient::enabled();
/// {
///     let _scope = ambient::with_enabled(Severity::WARNING.into());
///     assert_eq!(ambient::enabled(), SeverityMask::from(Severity::WARNING));
/// }
/// assert_eq!(ambient::enabled(), before);
/// ```
pub fn with_enabled(mask: SeverityMask) -> ReportingScope {
    let id = NEXT_REPORTING_SCOPE.fetch_add(1, Ordering::SeqCst);
    let mut scopes = REPORTING_SCOPES
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    scopes.push((id, set_enabled(mask)));

    ReportingScope { id }
}

/// Restores the previously enabled severities when dropped.
#[must_use = "the previous reporting level is restored when the scope is dropped"]
#[derive(Debug)]
pub struct ReportingScope {
    id: u64,
}

impl Drop for ReportingScope {
    fn drop(&mut self) {
        let mut scopes = REPORTING_SCOPES
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(pos) = scopes.iter().position(|(id, _)| *id == self.id) else {
            return;
        };

        let (_, previous) = scopes.remove(pos);
        match scopes.get_mut(pos) {
            // A newer scope is still live: it now restores what this one replaced.
            Some((_, newer_previous)) => *newer_previous = previous,
            None => {
                set_enabled(previous);
            }
        }
    }
}

/// Installs `handler` for the severities in `mask`.
///
/// The handler stays active until the returned scope is dropped or
/// [released](HandlerScope::release).
pub fn install<H>(mask: SeverityMask, handler: H) -> HandlerScope
where
    H: DiagnosticHandler + 'static,
{
    let id = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.handlers.push(Installed {
            id,
            mask,
            handler: Some(Box::new(handler)),
        });
        id
    });

    logging::installed(id, mask);

    HandlerScope {
        id,
        _not_send: PhantomData,
    }
}

/// Returns how many handlers are installed on this thread.
pub fn depth() -> usize {
    STATE.with(|state| state.borrow().handlers.len())
}

/// An installed handler. Dropping it uninstalls the handler.
#[must_use = "the handler is uninstalled as soon as the scope is dropped"]
#[derive(Debug)]
pub struct HandlerScope {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl HandlerScope {
    /// Returns the identifier of the installed handler.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Uninstalls the handler now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for HandlerScope {
    fn drop(&mut self) {
        let id = self.id;
        // The removed handler is dropped after the borrow ends.
        let removed = STATE
            .try_with(|state| {
                let mut state = state.borrow_mut();
                state
                    .handlers
                    .iter()
                    .rposition(|installed| installed.id == id)
                    .map(|pos| state.handlers.remove(pos))
            })
            .ok()
            .flatten();

        if removed.is_some() {
            logging::released(id);
        }
    }
}

/// Emits a diagnostic from the caller's source location.
///
/// # Examples
///
/// ```
/// use cloak::{Severity, ambient};
///
/// // With no handler installed the diagnostic goes to the default reporter.
/// ambient::emit(Severity::NOTICE, "undefined offset 3");
/// ```
#[track_caller]
pub fn emit(severity: Severity, message: impl Into<String>) {
    let location = Location::caller();
    dispatch(Diagnostic::new(severity, message).at(location.file(), location.line()));
}

/// Emits a diagnostic with an explicit source location.
pub fn emit_at(
    severity: Severity,
    message: impl Into<String>,
    file: impl Into<String>,
    line: u32,
) {
    dispatch(Diagnostic::new(severity, message).at(file, line));
}

/// Routes an already-built diagnostic through the handler stack.
pub fn dispatch(diagnostic: Diagnostic) {
    let severity = diagnostic.severity();

    let taken = STATE.with(|state| {
        let mut state = state.borrow_mut();
        match state.handlers.last_mut() {
            Some(top) if top.mask.contains(severity) => {
                let id = top.id;
                top.handler.take().map(|handler| (id, handler))
            }
            _ => None,
        }
    });

    let handled = match taken {
        Some((id, mut handler)) => {
            let handled = handler.handle(&diagnostic);
            STATE.with(|state| {
                let mut state = state.borrow_mut();
                if let Some(slot) = state.handlers.iter_mut().find(|i| i.id == id) {
                    slot.handler = Some(handler);
                }
            });
            handled
        }
        None => false,
    };

    if !handled && enabled().contains(severity) {
        logging::unhandled(&diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&Diagnostic) -> bool) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |d: &Diagnostic| {
            sink.borrow_mut().push(d.message().to_string());
            true
        })
    }

    #[test]
    fn handler_sees_only_masked_severities() {
        let (seen, handler) = recorder();
        let _scope = install(Severity::WARNING.into(), handler);

        emit(Severity::WARNING, "kept");
        emit(Severity::NOTICE, "ignored");

        assert_eq!(*seen.borrow(), vec!["kept".to_string()]);
    }

    #[test]
    fn emit_records_caller_location() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let _scope = install(SeverityMask::ALL, move |d: &Diagnostic| {
            *sink.borrow_mut() = Some((d.file().map(str::to_string), d.line()));
            true
        });

        emit(Severity::NOTICE, "here");

        let (file, line) = seen.borrow().clone().unwrap();
        assert!(file.unwrap().ends_with("ambient.rs"));
        assert!(line.unwrap() > 0);
    }

    #[test]
    fn emit_at_uses_the_given_location() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _scope = install(SeverityMask::ALL, move |d: &Diagnostic| {
            sink.borrow_mut().push(d.clone());
            true
        });

        emit_at(Severity::USER_WARNING, "explicit", "lib/io.rs", 7);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].file(), Some("lib/io.rs"));
        assert_eq!(seen[0].line(), Some(7));
    }

    #[test]
    fn nested_scopes_restore_outer_handler() {
        let (outer_seen, outer) = recorder();
        let (inner_seen, inner) = recorder();

        let outer_scope = install(SeverityMask::ALL, outer);
        {
            let _inner_scope = install(SeverityMask::ALL, inner);
            assert_eq!(depth(), 2);
            emit(Severity::WARNING, "inner");
        }
        assert_eq!(depth(), 1);
        emit(Severity::WARNING, "outer");
        outer_scope.release();

        assert_eq!(depth(), 0);
        assert_eq!(*inner_seen.borrow(), vec!["inner".to_string()]);
        assert_eq!(*outer_seen.borrow(), vec!["outer".to_string()]);
    }

    #[test]
    fn out_of_order_release_removes_the_right_handler() {
        let (first_seen, first) = recorder();
        let (_second_seen, second) = recorder();

        let first_scope = install(SeverityMask::ALL, first);
        let second_scope = install(SeverityMask::ALL, second);

        drop(first_scope);
        assert_eq!(depth(), 1);
        drop(second_scope);
        assert_eq!(depth(), 0);

        emit(Severity::WARNING, "after");
        assert!(first_seen.borrow().is_empty());
    }

    #[test]
    fn emission_inside_a_handler_does_not_recurse() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let _scope = install(SeverityMask::ALL, move |_: &Diagnostic| {
            *counter.borrow_mut() += 1;
            emit(Severity::NOTICE, "from inside the handler");
            true
        });

        emit(Severity::WARNING, "outer");
        emit(Severity::WARNING, "outer again");

        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn unhandled_diagnostic_falls_through() {
        let _scope = install(SeverityMask::ALL, |_: &Diagnostic| false);
        emit(Severity::DEPRECATED, "reported by default");
        assert_eq!(depth(), 1);
    }

    #[test]
    fn handler_scope_is_released_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _scope = install(SeverityMask::ALL, |_: &Diagnostic| true);
            panic!("work failed");
        });

        assert!(result.is_err());
        assert_eq!(depth(), 0);
    }
}
