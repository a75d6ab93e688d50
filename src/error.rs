//! Error type for the bit-vector engine.
//!
//! Library modules return `JxError`; the binary wraps it in `anyhow::Result`.
//! Malformed input lines are not errors: they are treated as records with no
//! membership. Everything represented here is fatal for the run.

use std::fmt;

/// Which bound an out-of-range index violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    /// Index of a vector within a store.
    Entity,
    /// Bit position within a vector.
    Bit,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Entity => write!(f, "entity"),
            IndexKind::Bit => write!(f, "bit position"),
        }
    }
}

#[derive(Debug)]
pub enum JxError {
    /// Entity index or bit position outside the configured population.
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        bound: usize,
    },

    /// A packed buffer could not be reserved.
    Allocation { bytes: usize },

    /// Reading input or writing output failed.
    Io(std::io::Error),
}

impl fmt::Display for JxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JxError::IndexOutOfRange { kind, index, bound } => write!(
                f,
                "{} {} is out of range (configured size is {}); check the population size settings",
                kind, index, bound
            ),
            JxError::Allocation { bytes } => {
                write!(f, "Failed to allocate {} bytes for bit vectors", bytes)
            }
            JxError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for JxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JxError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for JxError {
    fn from(e: std::io::Error) -> Self {
        JxError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, JxError>;
