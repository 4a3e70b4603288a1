//! Error types for the program parser.
//!
//! Only a handful of conditions are hard failures. Everything the parser can
//! survive (unrecognized layouts, ambiguous amounts, bad currency tokens) is
//! reported as a [`ParseIssue`](crate::requirement::ParseIssue) on the result
//! instead of an `Err`.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while parsing or post-processing a program.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input text exceeds the configured processing bound
    #[error("Input of {size} bytes exceeds the {limit} byte limit")]
    OversizedInput {
        /// Size of the rejected input in bytes
        size: usize,
        /// Configured maximum in bytes
        limit: usize,
    },

    /// Limit schedule is malformed or internally inconsistent
    #[error("Invalid limit schedule: {0}")]
    InvalidSchedule(String),

    /// Review overlay cannot be applied to the given program
    #[error("Overlay error: {0}")]
    Overlay(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a currency token is rejected by the amount parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Leading minus sign or accounting-style parentheses
    #[error("negative amount '{0}'")]
    Negative(String),

    /// Token is not a well-formed dollar figure
    #[error("non-numeric amount '{0}'")]
    NotNumeric(String),

    /// Figure does not fit in a u64 after applying its unit
    #[error("amount '{0}' overflows")]
    Overflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_input_error() {
        let err = Error::OversizedInput {
            size: 2_000_000,
            limit: 1_048_576,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("2000000"));
        assert!(msg.contains("1048576"));
    }

    #[test]
    fn test_amount_error_messages() {
        let err = AmountError::Negative("-$500".to_string());
        assert_eq!(format!("{}", err), "negative amount '-$500'");

        let err = AmountError::NotNumeric("$1,OOO".to_string());
        assert!(format!("{}", err).contains("non-numeric"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: Error = io.into();
        assert!(format!("{}", err).contains("missing.json"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<AmountError>();
    }
}
