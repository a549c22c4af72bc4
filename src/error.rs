//! Error types for tradebinder

use thiserror::Error;

/// Main error type for the marketplace core
#[derive(Error, Debug)]
pub enum MarketError {
    // Input validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // State machine errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("User {user} is not a participant of transaction {transaction}")]
    UnknownParticipant { user: String, transaction: String },

    // Store errors
    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(u64),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for marketplace operations
pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::ProposalNotFound("proposal_123".to_string());
        assert_eq!(err.to_string(), "Proposal not found: proposal_123");

        let err = MarketError::UnknownParticipant {
            user: "user7".to_string(),
            transaction: "4".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "User user7 is not a participant of transaction 4"
        );
    }

    #[test]
    fn test_result_type() {
        fn sample_function() -> Result<u64> {
            Ok(42)
        }

        assert_eq!(sample_function().unwrap(), 42);
    }

    #[test]
    fn test_json_error_conversion() {
        fn parse() -> Result<serde_json::Value> {
            let value = serde_json::from_str("not json")?;
            Ok(value)
        }

        assert!(matches!(parse().unwrap_err(), MarketError::Json(_)));
    }
}
