use serde::{Deserialize, Serialize};
use std::fmt;

/// Proficiency estimate for a learner on a topic.
///
/// The value always lies in `[0.0, 1.0]`. Construction goes through
/// [`Mastery::clamped`], so the invariant holds regardless of what a
/// collaborator reports.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mastery(f64);

impl Mastery {
    /// Builds a mastery value, clamping into `[0.0, 1.0]`.
    ///
    /// NaN collapses to `0.0` rather than poisoning later comparisons.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Mastery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Grade assigned to a single answer by the evaluator.
///
/// Same `[0.0, 1.0]` discipline as [`Mastery`], but scoped to one round.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    /// Builds a score, clamping into `[0.0, 1.0]`. NaN collapses to `0.0`.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
