use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ConfigError, ConfigErrorKind};

/// How a [`Cloak`](crate::Cloak) resolves captured diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// Fail only if the throw switch is enabled at invocation time.
    #[default]
    FollowDefault,
    /// Never fail because of captured diagnostics.
    Silent,
    /// Fail whenever at least one diagnostic was captured.
    Throw,
}

impl Policy {
    /// Returns the raw value of this policy.
    pub fn value(self) -> i64 {
        match self {
            Policy::FollowDefault => 0,
            Policy::Silent => 1,
            Policy::Throw => 2,
        }
    }

    /// Decides whether captured diagnostics become a failure.
    pub fn throws(self, by_default: bool) -> bool {
        match self {
            Policy::FollowDefault => by_default,
            Policy::Silent => false,
            Policy::Throw => true,
        }
    }
}

impl TryFrom<i64> for Policy {
    type Error = ConfigError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Policy::FollowDefault),
            1 => Ok(Policy::Silent),
            2 => Ok(Policy::Throw),
            _ => Err(ConfigError::new(
                ConfigErrorKind::InvalidPolicy(raw),
                "expected 0 (follow default), 1 (silent) or 2 (throw)",
            )),
        }
    }
}

impl std::str::FromStr for Policy {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "default" | "follow_default" => Ok(Policy::FollowDefault),
            "silent" => Ok(Policy::Silent),
            "throw" => Ok(Policy::Throw),
            _ => Err(ConfigError::new(
                ConfigErrorKind::UnknownPolicy(name.to_string()),
                "expected 'follow_default', 'silent' or 'throw'",
            )),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::FollowDefault => write!(f, "follow_default"),
            Policy::Silent => write!(f, "silent"),
            Policy::Throw => write!(f, "throw"),
        }
    }
}

/// The ways a policy can be given to a [`CloakBuilder`](crate::CloakBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySelector {
    /// An already-typed policy.
    Policy(Policy),
    /// A raw policy value.
    Raw(i64),
    /// A policy name.
    Name(String),
}

impl PolicySelector {
    pub(crate) fn resolve(self) -> Result<Policy, ConfigError> {
        match self {
            PolicySelector::Policy(policy) => Ok(policy),
            PolicySelector::Raw(raw) => Policy::try_from(raw),
            PolicySelector::Name(name) => name.parse(),
        }
    }
}

impl Default for PolicySelector {
    fn default() -> Self {
        PolicySelector::Policy(Policy::default())
    }
}

impl From<Policy> for PolicySelector {
    fn from(policy: Policy) -> Self {
        PolicySelector::Policy(policy)
    }
}

impl From<i64> for PolicySelector {
    fn from(raw: i64) -> Self {
        PolicySelector::Raw(raw)
    }
}

impl From<i32> for PolicySelector {
    fn from(raw: i32) -> Self {
        PolicySelector::Raw(raw.into())
    }
}

impl From<&str> for PolicySelector {
    fn from(name: &str) -> Self {
        PolicySelector::Name(name.to_string())
    }
}

static THROW_BY_DEFAULT: AtomicBool = AtomicBool::new(false);

/// The switch consulted by [`Policy::FollowDefault`].
///
/// [`ThrowSwitch::global`] is the process-wide switch toggled by
/// [`Cloak::enable_throw_by_default`](crate::Cloak::enable_throw_by_default).
/// [`ThrowSwitch::new`] creates an independent switch, which can be shared
/// between several cloaks by cloning it.
///
/// # Examples
///
/// ```
/// use cloak::ThrowSwitch;
///
/// let switch = ThrowSwitch::new();
/// let shared = switch.clone();
///
/// switch.enable();
/// assert!(shared.is_enabled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThrowSwitch {
    local: Option<Arc<AtomicBool>>,
}

impl ThrowSwitch {
    /// Creates an independent switch, initially disabled.
    pub fn new() -> Self {
        Self {
            local: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Returns a handle to the process-wide switch.
    pub fn global() -> Self {
        Self { local: None }
    }

    fn flag(&self) -> &AtomicBool {
        match &self.local {
            Some(flag) => flag,
            None => &THROW_BY_DEFAULT,
        }
    }

    /// Makes follow-default cloaks fail on captured diagnostics.
    pub fn enable(&self) {
        self.flag().store(true, Ordering::SeqCst);
    }

    /// Makes follow-default cloaks return normally on captured diagnostics.
    pub fn disable(&self) {
        self.flag().store(false, Ordering::SeqCst);
    }

    /// Returns the current state.
    pub fn is_enabled(&self) -> bool {
        self.flag().load(Ordering::SeqCst)
    }

    /// Returns true if this handle refers to the process-wide switch.
    pub fn is_global(&self) -> bool {
        self.local.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_map_to_policies() {
        for policy in [Policy::FollowDefault, Policy::Silent, Policy::Throw] {
            assert_eq!(Policy::try_from(policy.value()).unwrap(), policy);
        }
    }

    #[test]
    fn out_of_range_raw_value_is_rejected() {
        let err = Policy::try_from(3i64).unwrap_err();
        assert_eq!(err.kind(), &ConfigErrorKind::InvalidPolicy(3));
        assert!(Policy::try_from(-1i64).is_err());
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("THROW".parse::<Policy>().unwrap(), Policy::Throw);
        assert_eq!("follow-default".parse::<Policy>().unwrap(), Policy::FollowDefault);
        assert_eq!("silent".parse::<Policy>().unwrap(), Policy::Silent);

        let err = "loud".parse::<Policy>().unwrap_err();
        assert_eq!(err.kind(), &ConfigErrorKind::UnknownPolicy("loud".to_string()));
    }

    #[test]
    fn throws_merges_policy_and_switch() {
        assert!(!Policy::Silent.throws(true));
        assert!(!Policy::Silent.throws(false));
        assert!(Policy::Throw.throws(false));
        assert!(Policy::Throw.throws(true));
        assert!(Policy::FollowDefault.throws(true));
        assert!(!Policy::FollowDefault.throws(false));
    }

    #[test]
    fn selectors_resolve() {
        assert_eq!(PolicySelector::from(Policy::Silent).resolve().unwrap(), Policy::Silent);
        assert_eq!(PolicySelector::from(2i32).resolve().unwrap(), Policy::Throw);
        assert_eq!(PolicySelector::from("silent").resolve().unwrap(), Policy::Silent);
        assert_eq!(PolicySelector::default().resolve().unwrap(), Policy::FollowDefault);
        assert!(PolicySelector::from(42i64).resolve().is_err());
    }

    #[test]
    fn local_switches_are_independent() {
        let a = ThrowSwitch::new();
        let b = ThrowSwitch::new();

        a.enable();
        assert!(a.is_enabled());
        assert!(!b.is_enabled());
        assert!(!a.is_global());

        a.disable();
        assert!(!a.is_enabled());
    }

    #[test]
    fn default_switch_is_global() {
        assert!(ThrowSwitch::default().is_global());
        assert!(ThrowSwitch::global().is_global());
    }
}
