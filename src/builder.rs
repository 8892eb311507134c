use crate::{
    cloak::Cloak,
    error::ConfigError,
    policy::{PolicySelector, ThrowSwitch},
    severity::LevelSelector,
};

/// Builder for a [`Cloak`] from loosely typed settings.
///
/// Policies may be given as a [`Policy`](crate::Policy), a raw integer or a
/// name; levels as a [`SeverityMask`](crate::SeverityMask), a
/// [`Severity`](crate::Severity), a raw integer, a name, or not at all (the
/// ambient reporting level at build time). Selectors are validated only in
/// [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use cloak::{Cloak, Policy, Severity};
///
/// let cloak = Cloak::builder(|_: ()| ())
///     .policy("throw")
///     .level("E_USER_WARNING")
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(cloak.policy(), Policy::Throw);
/// assert!(cloak.reporting_level().contains(Severity::USER_WARNING));
/// ```
pub struct CloakBuilder<F> {
    work: F,
    policy: PolicySelector,
    level: LevelSelector,
    switch: ThrowSwitch,
}

impl<F> CloakBuilder<F> {
    /// Creates a builder with the follow-default policy, the ambient level
    /// and the process-wide throw switch.
    pub fn new(work: F) -> Self {
        Self {
            work,
            policy: PolicySelector::default(),
            level: LevelSelector::default(),
            switch: ThrowSwitch::global(),
        }
    }

    /// Sets the policy.
    pub fn policy(mut self, policy: impl Into<PolicySelector>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Sets the reporting level.
    pub fn level(mut self, level: impl Into<LevelSelector>) -> Self {
        self.level = level.into();
        self
    }

    /// Uses `switch` instead of the process-wide throw switch.
    pub fn throw_switch(mut self, switch: ThrowSwitch) -> Self {
        self.switch = switch;
        self
    }

    /// Resolves the selectors and creates the cloak.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the policy is not one of the three
    /// recognized values or the level names an unknown severity.
    ///
    /// # Examples
    ///
    /// ```
    /// use cloak::{Cloak, ConfigErrorKind};
    ///
    /// let err = Cloak::builder(|_: ()| ()).policy(5).build().unwrap_err();
    /// assert_eq!(err.kind(), &ConfigErrorKind::InvalidPolicy(5));
    /// ```
    pub fn build(self) -> Result<Cloak<F>, ConfigError> {
        let policy = self.policy.resolve()?;
        let level = self.level.resolve()?;

        Ok(Cloak::with_switch(self.work, policy, level, self.switch))
    }
}

impl<F> std::fmt::Debug for CloakBuilder<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloakBuilder")
            .field("policy", &self.policy)
            .field("level", &self.level)
            .field("switch", &self.switch)
            .finish_non_exhaustive()
    }
}
