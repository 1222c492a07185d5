//! Error types for the szamla-core library.

use thiserror::Error;

/// Main error type for the szamla library.
#[derive(Error, Debug)]
pub enum SzamlaError {
    /// Chunked transfer error.
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Bill extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Pattern registry error.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to the chunked document transfer protocol.
#[derive(Error, Debug)]
pub enum TransferError {
    /// `complete` was called before every declared chunk arrived.
    #[error("transfer incomplete: received {received} of {expected} chunks")]
    MissingChunks { received: usize, expected: usize },

    /// A chunk or completion message referenced an unknown transfer id.
    #[error("unknown transfer id: {0}")]
    UnknownTransfer(String),

    /// A chunk index outside the declared range.
    #[error("chunk index {index} out of range for {total} chunks")]
    ChunkOutOfRange { index: usize, total: usize },

    /// A transfer was declared with zero chunks.
    #[error("transfer declared with zero chunks")]
    EmptyTransfer,
}

/// Errors related to bill field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The matching phase exceeded its time budget.
    #[error("extraction timed out after {0} ms")]
    Timeout(u64),

    /// No pattern for the resolved language fired.
    #[error("no pattern matched for language '{0}'")]
    NoPatternMatch(String),
}

/// Errors related to pattern registration and loading.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Two patterns with the same id registered for one language.
    #[error("duplicate pattern id '{id}' for language '{language}'")]
    DuplicatePattern { id: String, language: String },

    /// A pattern's rule failed to compile as a regex.
    #[error("invalid rule in pattern '{pattern}': {reason}")]
    InvalidRule { pattern: String, reason: String },

    /// A pattern is missing its required amount rule.
    #[error("pattern '{0}' defines no amount rule")]
    MissingAmountRule(String),

    /// A pattern file could not be parsed.
    #[error("failed to parse pattern file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Unknown language code in a pattern record.
    #[error("unsupported language code: {0}")]
    UnsupportedLanguage(String),
}

/// Result type for the szamla library.
pub type Result<T> = std::result::Result<T, SzamlaError>;
