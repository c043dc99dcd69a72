//! Error handling for rillc
//!
//! Provides structured error types with source line tracking
//! for helpful diagnostic messages.

mod diagnostic;

use std::fmt;
use thiserror::Error;

pub use diagnostic::{format_error, print_error, print_errors};

/// Severity of a user-facing diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Fatal,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Fatal => write!(f, "fatal"),
        }
    }
}

/// A user-facing diagnostic tied to a source location
///
/// `file` and `user_line` are the coordinates of the line as the user wrote
/// it, recovered through the preprocessor's source map. `line` is the
/// internal (post-include) line number used to index the preprocessed text.
#[derive(Debug, Clone)]
pub struct SemanticReport {
    pub level: Level,
    pub file: String,
    pub user_line: usize,
    pub line: usize,
    pub line_text: String,
    pub messages: Vec<String>,
}

impl fmt::Display for SemanticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}@{}): {}",
            self.level,
            self.file,
            self.user_line,
            self.messages.first().map(String::as_str).unwrap_or("")
        )
    }
}

/// A compiler-internal report: an invariant was broken or an unreachable
/// branch was taken. Always fatal, never the user's fault.
#[derive(Debug, Clone)]
pub struct InternalReport {
    pub component: &'static str,
    pub file: &'static str,
    pub function: &'static str,
    pub messages: Vec<String>,
}

impl fmt::Display for InternalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "internal error in {} ({}::{}): {}",
            self.component,
            self.file,
            self.function,
            self.messages.first().map(String::as_str).unwrap_or("")
        )
    }
}

/// The main error type for rillc operations
#[derive(Error, Debug)]
pub enum RillcError {
    #[error("Lexer error: {message}")]
    Lexer { message: String, line: usize },

    #[error("Parser error: {message}")]
    Parser { message: String, line: usize },

    #[error("Semantic error: {0}")]
    Semantic(SemanticReport),

    #[error("{0}")]
    Internal(InternalReport),

    #[error("Preprocessor error: {message}")]
    Preprocessor { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RillcError {
    /// Get the internal line number associated with this error, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            RillcError::Lexer { line, .. } => Some(*line),
            RillcError::Parser { line, .. } => Some(*line),
            RillcError::Semantic(report) => Some(report.line),
            RillcError::Internal(_) => None,
            RillcError::Preprocessor { .. } => None,
            RillcError::Io(_) => None,
        }
    }

    /// Create a lexer error
    pub fn lexer(message: impl Into<String>, line: usize) -> Self {
        RillcError::Lexer {
            message: message.into(),
            line,
        }
    }

    /// Create a parser error
    pub fn parser(message: impl Into<String>, line: usize) -> Self {
        RillcError::Parser {
            message: message.into(),
            line,
        }
    }

    /// Create a preprocessor error
    pub fn preprocessor(message: impl Into<String>) -> Self {
        RillcError::Preprocessor {
            message: message.into(),
        }
    }
}

/// Result type alias for rillc operations
pub type RillcResult<T> = Result<T, RillcError>;
