use thiserror::Error;

/// Validation and contract errors exposed by `strikeboard-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("symbol must contain at least one ASCII letter: '{value}'")]
    SymbolWithoutLetter { value: String },

    #[error("invalid section '{value}', expected one of call-resistance, call-support, put-resistance, put-support")]
    InvalidSection { value: String },
    #[error("invalid trigger '{value}', expected one of manual, upload, watch, single")]
    InvalidTrigger { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("invalid date '{value}', expected YYYY-MM-DD or DD.MM.YYYY")]
    InvalidDate { value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}
