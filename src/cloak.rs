use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    ambient,
    builder::CloakBuilder,
    collection::DiagnosticCollection,
    diagnostic::Diagnostic,
    error::Failure,
    logging,
    policy::{Policy, ThrowSwitch},
    severity::{Severity, SeverityMask},
};

/// Runs a unit of work while capturing the diagnostics it emits.
///
/// Each invocation installs an interception handler for the cloak's
/// reporting level, runs the work, uninstalls the handler on every exit
/// path and then applies the policy:
///
/// - nothing captured: the work's result is returned;
/// - [`Policy::Silent`]: the result is returned, diagnostics stay
///   available through [`errors`](Self::errors);
/// - [`Policy::Throw`]: the captured [`DiagnosticCollection`] is returned
///   as the failure;
/// - [`Policy::FollowDefault`]: behaves like `Throw` if the cloak's
///   [`ThrowSwitch`] is enabled when the invocation finishes, otherwise
///   like `Silent`.
///
/// A cloak is reusable; each invocation starts from an empty collection.
///
/// # Examples
///
/// ```
/// use cloak::{Cloak, Policy, Severity, emit};
///
/// let mut parse = Cloak::notice(
///     |input: &str| -> Result<i32, std::num::ParseIntError> {
///         if input.starts_with('+') {
///             emit(Severity::NOTICE, "leading '+' is redundant");
///         }
///         input.parse()
///     },
///     Policy::Silent,
/// );
///
/// assert_eq!(parse.invoke("+42").unwrap(), 42);
/// assert_eq!(parse.errors().len(), 1);
///
/// assert_eq!(parse.invoke("7").unwrap(), 7);
/// assert!(parse.errors().is_empty());
/// ```
pub struct Cloak<F> {
    work: F,
    policy: Policy,
    level: SeverityMask,
    switch: ThrowSwitch,
    errors: DiagnosticCollection,
}

impl<F> Cloak<F> {
    /// Creates a cloak from already-typed settings, using the process-wide
    /// throw switch.
    pub fn new(work: F, policy: Policy, level: SeverityMask) -> Self {
        Self::with_switch(work, policy, level, ThrowSwitch::global())
    }

    pub(crate) fn with_switch(
        work: F,
        policy: Policy,
        level: SeverityMask,
        switch: ThrowSwitch,
    ) -> Self {
        Self {
            work,
            policy,
            level,
            switch,
            errors: DiagnosticCollection::new(),
        }
    }

    /// Starts a builder accepting untyped policy and level selectors.
    pub fn builder(work: F) -> CloakBuilder<F> {
        CloakBuilder::new(work)
    }

    /// Captures warnings (`E_WARNING`).
    pub fn warning(work: F, policy: Policy) -> Self {
        Self::new(work, policy, Severity::WARNING.into())
    }

    /// Captures notices (`E_NOTICE`).
    pub fn notice(work: F, policy: Policy) -> Self {
        Self::new(work, policy, Severity::NOTICE.into())
    }

    /// Captures deprecations (`E_DEPRECATED`).
    pub fn deprecated(work: F, policy: Policy) -> Self {
        Self::new(work, policy, Severity::DEPRECATED.into())
    }

    /// Captures user warnings (`E_USER_WARNING`).
    pub fn user_warning(work: F, policy: Policy) -> Self {
        Self::new(work, policy, Severity::USER_WARNING.into())
    }

    /// Captures user notices (`E_USER_NOTICE`).
    pub fn user_notice(work: F, policy: Policy) -> Self {
        Self::new(work, policy, Severity::USER_NOTICE.into())
    }

    /// Captures user deprecations (`E_USER_DEPRECATED`).
    pub fn user_deprecated(work: F, policy: Policy) -> Self {
        Self::new(work, policy, Severity::USER_DEPRECATED.into())
    }

    /// Captures every severity (`E_ALL`).
    pub fn all(work: F, policy: Policy) -> Self {
        Self::new(work, policy, SeverityMask::ALL)
    }

    /// Returns the diagnostics captured by the most recent invocation.
    pub fn errors(&self) -> &DiagnosticCollection {
        &self.errors
    }

    /// Returns the severities this cloak intercepts.
    pub fn reporting_level(&self) -> SeverityMask {
        self.level
    }

    /// Returns the configured policy.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Returns true if captured diagnostics would currently become a failure.
    pub fn errors_are_thrown(&self) -> bool {
        self.policy.throws(self.switch.is_enabled())
    }

    /// Exact complement of [`errors_are_thrown`](Self::errors_are_thrown).
    pub fn errors_are_silenced(&self) -> bool {
        !self.errors_are_thrown()
    }

    /// Invokes fallible work.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::Work`] with the work's own error, untouched, if the
    /// work fails. Otherwise returns [`Failure::Diagnostics`] if diagnostics
    /// were captured and the policy says they should fail the call.
    pub fn invoke<A, T, E>(&mut self, args: A) -> Result<T, Failure<E>>
    where
        F: FnMut(A) -> Result<T, E>,
    {
        let outcome = self.intercept(args);
        let value = outcome.map_err(Failure::Work)?;
        self.resolve(value).map_err(Failure::Diagnostics)
    }

    /// Invokes infallible work.
    ///
    /// # Errors
    ///
    /// Returns the captured diagnostics if the policy says they should fail
    /// the call.
    pub fn run<A, T>(&mut self, args: A) -> Result<T, DiagnosticCollection>
    where
        F: FnMut(A) -> T,
    {
        let value = self.intercept(args);
        self.resolve(value)
    }

    fn intercept<A, R>(&mut self, args: A) -> R
    where
        F: FnMut(A) -> R,
    {
        if self.errors.is_not_empty() {
            self.errors = DiagnosticCollection::new();
        }

        let captured = Rc::new(RefCell::new(DiagnosticCollection::new()));
        let sink = Rc::clone(&captured);
        let level = self.level;

        let scope = ambient::install(level, move |diagnostic: &Diagnostic| {
            // Severities disabled in the ambient configuration are swallowed.
            if ambient::enabled().contains(diagnostic.severity()) {
                logging::captured(level, diagnostic);
                sink.borrow_mut().record(diagnostic.clone());
            }
            true
        });

        // `scope` uninstalls the handler on unwind as well.
        let outcome = (self.work)(args);
        scope.release();

        self.errors = captured.take();
        outcome
    }

    fn resolve<T>(&self, value: T) -> Result<T, DiagnosticCollection> {
        if self.errors.is_empty() || self.errors_are_silenced() {
            Ok(value)
        } else {
            Err(self.errors.clone())
        }
    }
}

// Switch operations do not depend on the work type.
impl Cloak<()> {
    /// Enables the process-wide throw switch.
    ///
    /// Affects every follow-default cloak using [`ThrowSwitch::global`],
    /// including ones constructed earlier.
    pub fn enable_throw_by_default() {
        ThrowSwitch::global().enable();
    }

    /// Disables the process-wide throw switch.
    pub fn disable_throw_by_default() {
        ThrowSwitch::global().disable();
    }

    /// Returns the state of the process-wide throw switch.
    pub fn throws_by_default() -> bool {
        ThrowSwitch::global().is_enabled()
    }
}

impl<F> std::fmt::Debug for Cloak<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloak")
            .field("policy", &self.policy)
            .field("level", &self.level)
            .field("switch", &self.switch)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
