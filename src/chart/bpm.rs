//! Strictly positive, finite tempo definition.

use thiserror::Error;

/// Beats per minute. The value is always finite and greater than zero.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct Bpm(f64);

impl Eq for Bpm {}
impl PartialOrd for Bpm {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Bpm {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<Bpm> for f64 {
    fn from(value: Bpm) -> Self {
        value.as_f64()
    }
}

/// Error type for `Bpm::try_from`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("positive finite bpm expected: {0}")]
pub struct TryFromBpmError(pub(crate) f64);

impl TryFromBpmError {
    /// Gets the rejected value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Bpm {
    type Error = TryFromBpmError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        (value.is_finite() && value > 0.0)
            .then_some(Self(value))
            .ok_or(TryFromBpmError(value))
    }
}

impl AsRef<f64> for Bpm {
    fn as_ref(&self) -> &f64 {
        &self.0
    }
}

impl std::fmt::Display for Bpm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Bpm {
    /// Creates a new `Bpm` if `value` is finite and positive, otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Gets the internal value.
    #[inline]
    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.0
    }

    /// Duration of one 4/4 section in milliseconds at this tempo: `4 * 60000 / bpm`.
    #[inline]
    #[must_use]
    pub fn section_duration_ms(self) -> f64 {
        4.0 * (60_000.0 / self.0)
    }
}
