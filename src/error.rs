//! Crate error type
//!
//! Per-stream failures never surface here; they are contained in the reader
//! cycle and reported as events. This covers setup failures only.

use std::io;
use std::time::TryFromFloatSecsError;

use crate::substrate::{PredicateError, SourceSpecError};

/// Result alias for setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Setup error
#[derive(Debug)]
pub enum Error {
    /// Socket setup failed
    Io(io::Error),
    /// Malformed discovery predicate
    Predicate(PredicateError),
    /// Malformed synthetic source description
    SourceSpec(SourceSpecError),
    /// A number of seconds that is negative, not finite or too large
    Duration(TryFromFloatSecsError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Predicate(e) => write!(f, "{}", e),
            Error::SourceSpec(e) => write!(f, "Invalid source: {}", e),
            Error::Duration(e) => write!(f, "Invalid duration: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Predicate(e) => Some(e),
            Error::SourceSpec(e) => Some(e),
            Error::Duration(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<PredicateError> for Error {
    fn from(e: PredicateError) -> Self {
        Error::Predicate(e)
    }
}

impl From<SourceSpecError> for Error {
    fn from(e: SourceSpecError) -> Self {
        Error::SourceSpec(e)
    }
}

impl From<TryFromFloatSecsError> for Error {
    fn from(e: TryFromFloatSecsError) -> Self {
        Error::Duration(e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::substrate::Predicate;

    fn parse(predicate: &str) -> Result<Predicate> {
        Ok(Predicate::parse(predicate)?)
    }

    #[test]
    fn test_predicate_error_converts() {
        let err = parse("type=").unwrap_err();

        assert!(matches!(err, Error::Predicate(_)));
        assert_eq!(err.to_string().matches("Malformed predicate").count(), 1);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_duration_error_converts() {
        let err: Error = std::time::Duration::try_from_secs_f64(f64::INFINITY)
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::Duration(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_source_spec_error_converts() {
        let err: Error = "EEG"
            .parse::<crate::substrate::SyntheticSource>()
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::SourceSpec(SourceSpecError::MissingField("name"))));
    }
}
