use std::fmt;
use std::ops::BitOr;

use crate::{
    ambient,
    error::{ConfigError, ConfigErrorKind},
};

static KNOWN: [(Severity, &str); 6] = [
    (Severity::WARNING, "E_WARNING"),
    (Severity::NOTICE, "E_NOTICE"),
    (Severity::USER_WARNING, "E_USER_WARNING"),
    (Severity::USER_NOTICE, "E_USER_NOTICE"),
    (Severity::DEPRECATED, "E_DEPRECATED"),
    (Severity::USER_DEPRECATED, "E_USER_DEPRECATED"),
];

/// Classification flag of an emitted diagnostic.
///
/// The set of severities is closed: the associated constants below are the
/// only flags the ambient facility emits. The raw values are single bits so
/// that severities combine into a [`SeverityMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Severity(u32);

impl Severity {
    /// Run-time warning.
    pub const WARNING: Severity = Severity(2);
    /// Run-time notice.
    pub const NOTICE: Severity = Severity(8);
    /// Warning raised explicitly by user code.
    pub const USER_WARNING: Severity = Severity(512);
    /// Notice raised explicitly by user code.
    pub const USER_NOTICE: Severity = Severity(1024);
    /// Use of a deprecated feature.
    pub const DEPRECATED: Severity = Severity(8192);
    /// Deprecation raised explicitly by user code.
    pub const USER_DEPRECATED: Severity = Severity(16384);

    /// Returns every known severity, lowest flag first.
    pub fn all() -> impl Iterator<Item = Severity> {
        KNOWN.iter().map(|(severity, _)| *severity)
    }

    /// Resolves a symbolic name to its severity.
    ///
    /// Accepts the constant form (`E_USER_NOTICE`) and the short form
    /// (`user_notice`), ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Severity> {
        let upper = name.trim().to_ascii_uppercase();
        let constant = if upper.starts_with("E_") {
            upper
        } else {
            format!("E_{}", upper)
        };

        KNOWN
            .iter()
            .find(|(_, known)| *known == constant)
            .map(|(severity, _)| *severity)
    }

    /// Returns the raw flag value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns the symbolic name, or `None` for a flag outside the known set.
    pub fn name(self) -> Option<&'static str> {
        KNOWN
            .iter()
            .find(|(severity, _)| *severity == self)
            .map(|(_, name)| *name)
    }

    /// Returns true for the warning-class severities.
    pub fn is_warning(self) -> bool {
        self == Severity::WARNING || self == Severity::USER_WARNING
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "E_UNKNOWN({})", self.0),
        }
    }
}

/// A selection over the known severities.
///
/// Masks are plain values: once attached to a [`Cloak`](crate::Cloak) they
/// never change, even if the ambient reporting configuration does.
///
/// # Examples
///
/// ```
/// use cloak::{Severity, SeverityMask};
///
/// let mask = SeverityMask::from_name("warning").unwrap() | Severity::NOTICE;
/// assert!(mask.contains(Severity::WARNING));
/// assert!(mask.contains(Severity::NOTICE));
/// assert!(!mask.contains(Severity::DEPRECATED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityMask(u32);

impl SeverityMask {
    /// Mask selecting nothing.
    pub const EMPTY: SeverityMask = SeverityMask(0);
    /// Mask selecting every severity.
    pub const ALL: SeverityMask = SeverityMask(32767);

    /// Creates a mask from a raw value. Unknown bits are kept as-is.
    pub fn from_value(raw: u32) -> Self {
        Self(raw)
    }

    /// Creates a mask from a symbolic name.
    ///
    /// Besides the single-severity names understood by
    /// [`Severity::from_name`], `E_ALL` / `all` selects every severity.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] of kind
    /// [`UnknownSeverity`](ConfigErrorKind::UnknownSeverity) if the name
    /// does not map to a known flag.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        if name.trim().eq_ignore_ascii_case("e_all") || name.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::ALL);
        }

        Severity::from_name(name).map(Self::from).ok_or_else(|| {
            ConfigError::new(
                ConfigErrorKind::UnknownSeverity(name.to_string()),
                "name does not match any known severity",
            )
        })
    }

    /// Reads the severities currently enabled for default reporting.
    ///
    /// The value is captured now; later changes to the ambient configuration
    /// do not affect the returned mask.
    pub fn ambient() -> Self {
        ambient::enabled()
    }

    /// Returns true if `severity` is selected by this mask.
    pub fn contains(self, severity: Severity) -> bool {
        self.0 & severity.bits() != 0
    }

    /// Returns the raw value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if no severity is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Severity> for SeverityMask {
    fn from(severity: Severity) -> Self {
        Self(severity.bits())
    }
}

impl<T: Into<SeverityMask>> BitOr<T> for SeverityMask {
    type Output = SeverityMask;

    fn bitor(self, rhs: T) -> SeverityMask {
        SeverityMask(self.0 | rhs.into().0)
    }
}

impl BitOr for Severity {
    type Output = SeverityMask;

    fn bitor(self, rhs: Severity) -> SeverityMask {
        SeverityMask(self.0 | rhs.0)
    }
}

impl fmt::Display for SeverityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("E_ALL");
        }

        let names: Vec<&str> = Severity::all()
            .filter(|severity| self.contains(*severity))
            .filter_map(Severity::name)
            .collect();

        if names.is_empty() {
            write!(f, "{:#x}", self.0)
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

/// The ways a reporting level can be given to a [`CloakBuilder`](crate::CloakBuilder).
///
/// Each variant is resolved once, when the builder runs, into a single
/// [`SeverityMask`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelSelector {
    /// A ready-made mask.
    Mask(SeverityMask),
    /// A symbolic severity name.
    Name(String),
    /// A raw mask value.
    Raw(u32),
    /// Whatever the ambient configuration enables at build time.
    #[default]
    Ambient,
}

impl LevelSelector {
    pub(crate) fn resolve(self) -> Result<SeverityMask, ConfigError> {
        match self {
            LevelSelector::Mask(mask) => Ok(mask),
            LevelSelector::Name(name) => SeverityMask::from_name(&name),
            LevelSelector::Raw(raw) => Ok(SeverityMask::from_value(raw)),
            LevelSelector::Ambient => Ok(SeverityMask::ambient()),
        }
    }
}

impl From<SeverityMask> for LevelSelector {
    fn from(mask: SeverityMask) -> Self {
        LevelSelector::Mask(mask)
    }
}

impl From<Severity> for LevelSelector {
    fn from(severity: Severity) -> Self {
        LevelSelector::Mask(severity.into())
    }
}

impl From<&str> for LevelSelector {
    fn from(name: &str) -> Self {
        LevelSelector::Name(name.to_string())
    }
}

impl From<String> for LevelSelector {
    fn from(name: String) -> Self {
        LevelSelector::Name(name)
    }
}

impl From<u32> for LevelSelector {
    fn from(raw: u32) -> Self {
        LevelSelector::Raw(raw)
    }
}

impl From<Option<SeverityMask>> for LevelSelector {
    fn from(mask: Option<SeverityMask>) -> Self {
        mask.map_or(LevelSelector::Ambient, LevelSelector::Mask)
    }
}
