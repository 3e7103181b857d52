//! Error types for the pipeline stages.
//!
//! Row-level problems never surface here: malformed values are missing in
//! the model and counted in stage reports.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkageError {
    /// The mortality source holds several registrations for the same person
    /// and the duplicate policy is `strict`.
    #[error("mortality source has {count} duplicated person identifier(s): {}", .sample.join(", "))]
    DuplicateIdentifiers { count: usize, sample: Vec<String> },
}

pub type Result<T> = std::result::Result<T, LinkageError>;
