//! Error types for the diff pipeline.
//!
//! These cover invalid input that must be rejected before any rendering
//! happens. Degraded rendering (a layer failing, a missing element) is logged
//! instead, and cancellation is reported through
//! [`ProcessOutcome`](crate::processor::ProcessOutcome), never as an error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("Invalid preference {name}: {value} (must be a positive number)")]
    InvalidPreference { name: &'static str, value: i64 },

    #[error("Chunk {index} is marked common but has {a} lines on the left and {b} on the right")]
    MismatchedCommonChunk { index: usize, a: usize, b: usize },

    #[error("Invalid line number: {0} (line numbers start at 1)")]
    InvalidLineNumber(u32),

    #[error("Cannot add a delta line to a non-delta group")]
    DeltaLineInCommonGroup,
}

pub type Result<T> = std::result::Result<T, DiffError>;
