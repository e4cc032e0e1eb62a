//! The closed index set for the three proposed methods.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("method index {0} is out of range (expected 0, 1, or 2)")]
pub struct MethodIndexError(pub usize);

/// Index of one of the three generated methods.
///
/// `A`, `B`, `C` map to positions 0, 1, 2. The mapping is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MethodIndex {
    A,
    B,
    C,
}

impl MethodIndex {
    pub const ALL: [MethodIndex; 3] = [MethodIndex::A, MethodIndex::B, MethodIndex::C];

    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            MethodIndex::A => 0,
            MethodIndex::B => 1,
            MethodIndex::C => 2,
        }
    }

    #[must_use]
    pub const fn label(self) -> char {
        match self {
            MethodIndex::A => 'A',
            MethodIndex::B => 'B',
            MethodIndex::C => 'C',
        }
    }
}

impl TryFrom<usize> for MethodIndex {
    type Error = MethodIndexError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MethodIndex::A),
            1 => Ok(MethodIndex::B),
            2 => Ok(MethodIndex::C),
            other => Err(MethodIndexError(other)),
        }
    }
}

impl std::fmt::Display for MethodIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Method {}", self.label())
    }
}
