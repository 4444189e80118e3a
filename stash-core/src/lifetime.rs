//! Freshness windows for cache reads.

use std::fmt;
use std::time::Duration;

use crate::error::{Result, StashError};

/// How long an entry stays fresh since it was stored or last read.
///
/// Expiration is sliding: every hit restarts the window. `Infinite` entries
/// never go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// The entry never expires.
    #[default]
    Infinite,
    /// The entry is fresh while strictly younger than this duration.
    Finite(Duration),
}

impl Lifetime {
    /// Lifetime of `secs` whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self::Finite(Duration::from_secs(secs))
    }

    /// Lifetime of `millis` milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self::Finite(Duration::from_millis(millis))
    }

    /// Parses a fractional number of seconds from untrusted input.
    ///
    /// Negative, NaN and infinite values are rejected.
    pub fn try_from_secs_f64(secs: f64) -> Result<Self> {
        if !secs.is_finite() {
            return Err(StashError::InvalidLifetime(format!(
                "{secs} is not a finite number of seconds"
            )));
        }
        if secs < 0.0 {
            return Err(StashError::InvalidLifetime(format!(
                "{secs} seconds is negative"
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map(Self::Finite)
            .map_err(|e| StashError::InvalidLifetime(format!("{secs} seconds: {e}")))
    }

    /// Builds a lifetime from fractional seconds.
    ///
    /// # Panics
    ///
    /// Panics if `secs` is negative or not finite.
    #[track_caller]
    pub fn from_secs_f64(secs: f64) -> Self {
        match Self::try_from_secs_f64(secs) {
            Ok(lifetime) => lifetime,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns true for the never-expires sentinel.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Returns the window length, or `None` for `Infinite`.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Infinite => None,
            Self::Finite(d) => Some(*d),
        }
    }

    /// Returns true if an entry of the given age is still fresh.
    ///
    /// A zero lifetime is never fresh.
    pub fn is_fresh(&self, age: Duration) -> bool {
        match self {
            Self::Infinite => true,
            Self::Finite(lifetime) => age < *lifetime,
        }
    }
}

impl From<Duration> for Lifetime {
    fn from(d: Duration) -> Self {
        Self::Finite(d)
    }
}

impl From<Option<Duration>> for Lifetime {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Self::Infinite, Self::Finite)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinite => f.write_str("infinite"),
            Self::Finite(d) => write!(f, "{:?}", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(Lifetime::Infinite, 0, true ; "infinite at zero")]
    #[test_case(Lifetime::Infinite, u64::MAX, true ; "infinite forever")]
    #[test_case(Lifetime::from_secs(0), 0, false ; "zero lifetime never fresh")]
    #[test_case(Lifetime::from_secs(5), 4_999, true ; "just under")]
    #[test_case(Lifetime::from_secs(5), 5_000, false ; "exactly at boundary")]
    #[test_case(Lifetime::from_secs(5), 6_000, false ; "past boundary")]
    fn test_is_fresh(lifetime: Lifetime, age_ms: u64, fresh: bool) {
        assert_eq!(lifetime.is_fresh(Duration::from_millis(age_ms)), fresh);
    }

    #[test]
    fn test_default_is_infinite() {
        assert!(Lifetime::default().is_infinite());
        assert_eq!(Lifetime::default().as_duration(), None);
    }

    #[test]
    fn test_from_secs_f64() {
        assert_eq!(Lifetime::from_secs_f64(1.5), Lifetime::from_millis(1_500));
        assert_eq!(Lifetime::from_secs_f64(0.0), Lifetime::from_secs(0));
    }

    #[test_case(-1.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinity")]
    fn test_try_from_secs_f64_rejects(secs: f64) {
        let err = Lifetime::try_from_secs_f64(secs).unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    #[should_panic(expected = "Invalid lifetime")]
    fn test_from_secs_f64_panics_on_negative() {
        let _ = Lifetime::from_secs_f64(-0.5);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Lifetime::from(Duration::from_secs(3)), Lifetime::from_secs(3));
        assert_eq!(Lifetime::from(None), Lifetime::Infinite);
        assert_eq!(Lifetime::from(Some(Duration::ZERO)), Lifetime::from_secs(0));
        assert_eq!(Lifetime::Infinite.to_string(), "infinite");
    }

    proptest! {
        #[test]
        fn fresh_iff_younger_than_window(window in 0u64..10_000, age in 0u64..20_000) {
            let lifetime = Lifetime::from_millis(window);
            prop_assert_eq!(lifetime.is_fresh(Duration::from_millis(age)), age < window);
        }
    }
}
