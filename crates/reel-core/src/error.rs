//! Error types for Reel.

use std::fmt;
use thiserror::Error;

/// Main error type for Reel operations.
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{stack} stack is full ({capacity} entries)")]
    StackFull {
        stack: &'static str,
        capacity: usize,
    },

    #[error("Source error: {0}")]
    Source(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Reel operations.
pub type Result<T> = std::result::Result<T, ReelError>;

/// A push onto a bounded stack was refused.
///
/// The rejected item is handed back so the caller keeps ownership of it.
pub struct StackFull<T> {
    pub item: T,
    pub stack: &'static str,
    pub capacity: usize,
}

impl<T> StackFull<T> {
    /// Recover the item that could not be pushed.
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for StackFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackFull")
            .field("stack", &self.stack)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for StackFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stack is full ({} entries)", self.stack, self.capacity)
    }
}

impl<T> std::error::Error for StackFull<T> {}

impl<T> From<StackFull<T>> for ReelError {
    fn from(err: StackFull<T>) -> Self {
        ReelError::StackFull {
            stack: err.stack,
            capacity: err.capacity,
        }
    }
}
