//! Confidence score attached to a completed extraction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence of an extraction on a 0-100 scale
///
/// Providers currently report a fixed value per successful call; the type
/// only guarantees the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConfidenceScore(u8);

impl ConfidenceScore {
    /// Upper bound of the scale
    pub const MAX: u8 = 100;

    /// Create a score, rejecting values above 100
    pub fn new(value: u8) -> Result<Self, String> {
        if value > Self::MAX {
            return Err(format!("Confidence score {} out of range [0, 100]", value));
        }
        Ok(Self(value))
    }

    /// Get the raw score
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ConfidenceScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfidenceScore> for u8 {
    fn from(score: ConfidenceScore) -> Self {
        score.0
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
