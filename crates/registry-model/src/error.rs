use thiserror::Error;

/// Errors raised when a code supplied by configuration cannot be canonicalized.
///
/// Codes read from source tables never produce this error; they resolve to
/// `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("invalid site code '{0}'")]
    InvalidSite(String),
    #[error("invalid region code '{0}'")]
    InvalidRegion(String),
    #[error("invalid person identifier '{0}'")]
    InvalidPersonId(String),
}

pub type Result<T> = std::result::Result<T, CodeError>;
