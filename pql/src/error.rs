//! Error types for PQL operations.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid node: {0}")]
    InvalidNode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Syntax error for a whole PQL input. There is no partial tree on failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error at offset {position} in {input:?}: {message}")]
pub struct ParseError {
    /// The full text that was being parsed.
    pub input: String,
    /// Byte offset where parsing stopped.
    pub position: usize,
    /// Diagnostic message.
    pub message: String,
}

impl ParseError {
    pub fn new(input: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            position,
            message: message.into(),
        }
    }
}
