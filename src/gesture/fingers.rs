//! The 5-finger extended/folded vector produced by the hand tracker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a [`FingerVector`] from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerVectorError {
    /// The input did not contain exactly five values.
    #[error("expected 5 finger values, got {0}")]
    Length(usize),

    /// A value other than 0 or 1 was supplied.
    #[error("finger value at position {index} must be 0 or 1, got {value}")]
    Value { index: usize, value: u8 },
}

/// Finger states ordered thumb, index, middle, ring, pinky; `1` is extended.
///
/// Serialises as a plain JSON array (`[1, 0, 0, 0, 0]`) and rejects anything
/// that is not five binary values on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "[u8; 5]")]
pub struct FingerVector([u8; 5]);

impl FingerVector {
    /// All fingers folded. Also what readers see while no hand is detected.
    pub const FOLDED: FingerVector = FingerVector([0; 5]);

    /// Build a vector, checking every value is 0 or 1.
    pub fn new(values: [u8; 5]) -> Result<Self, FingerVectorError> {
        for (index, &value) in values.iter().enumerate() {
            if value > 1 {
                return Err(FingerVectorError::Value { index, value });
            }
        }
        Ok(Self(values))
    }

    /// Table constructor; literals in the gesture table are known-binary.
    pub(crate) const fn from_bits(values: [u8; 5]) -> Self {
        Self(values)
    }

    /// The raw values in thumb → pinky order.
    pub fn values(&self) -> [u8; 5] {
        self.0
    }

    /// Number of extended fingers.
    pub fn extended_count(&self) -> usize {
        self.0.iter().filter(|&&v| v == 1).count()
    }
}

impl TryFrom<Vec<u8>> for FingerVector {
    type Error = FingerVectorError;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        let array: [u8; 5] = values
            .as_slice()
            .try_into()
            .map_err(|_| FingerVectorError::Length(values.len()))?;
        Self::new(array)
    }
}

impl From<FingerVector> for [u8; 5] {
    fn from(fingers: FingerVector) -> Self {
        fingers.0
    }
}

impl std::fmt::Display for FingerVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for v in self.0 {
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
