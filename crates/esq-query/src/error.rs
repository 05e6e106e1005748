//! Error types for query tokenizing, grouping, and compilation.
//!
//! Each pipeline stage has its own error type. [`QueryError`] unifies them for
//! callers that only care that a query was rejected and why.

use std::{error::Error, fmt};

/// Tokenizer error with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeError {
    /// Error message.
    pub message: String,
    /// Byte position in input where error occurred.
    pub position: usize,
    /// The original input string.
    pub input: String,
}

impl TokenizeError {
    /// Creates a new tokenizer error.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl Error for TokenizeError {}

/// Parenthesis balance error raised while grouping tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbalancedParenError {
    /// Error message.
    pub message: String,
    /// Token index where error occurred (if applicable).
    pub token_index: Option<usize>,
}

impl UnbalancedParenError {
    /// Creates a new unbalanced parenthesis error.
    pub fn new(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token_index,
        }
    }
}

impl fmt::Display for UnbalancedParenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(idx) = self.token_index {
            write!(f, "at token {}: {}", idx, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl Error for UnbalancedParenError {}

/// Error during query compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Error message.
    pub message: String,
}

impl CompileError {
    /// Creates a new compile error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Groups nest deeper than `max_depth`.
    pub fn too_deep(max_depth: usize) -> Self {
        Self::new(format!(
            "groups nest deeper than the maximum of {max_depth} levels"
        ))
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CompileError {}

/// Failure reported by a [`NestedResolver`](crate::NestedResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    /// Field that was being resolved.
    pub field: String,
    /// Error message.
    pub message: String,
}

impl ResolveError {
    /// Creates a new resolver error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot resolve field '{}': {}", self.field, self.message)
    }
}

impl Error for ResolveError {}

/// A unified error type for query compilation.
///
/// This type provides detailed error messages with context, including
/// the original query string and position indicators where applicable.
#[derive(Debug, Clone)]
pub struct QueryError {
    /// The kind of error that occurred.
    pub kind: QueryErrorKind,
    /// The original query string (if available).
    pub query: Option<String>,
}

/// The specific kind of query error.
#[derive(Debug, Clone)]
pub enum QueryErrorKind {
    /// Tokenizing failed (unterminated quote, misplaced operator, malformed term).
    Tokenize {
        /// Error message.
        message: String,
        /// Byte position in input.
        position: usize,
    },
    /// Parentheses do not balance.
    UnbalancedParen {
        /// Error message.
        message: String,
    },
    /// The grouped tree could not be compiled.
    Compile {
        /// Error message.
        message: String,
    },
    /// The nested-path resolver failed.
    Resolve(ResolveError),
}

impl QueryError {
    /// Creates a tokenize error.
    pub fn tokenize(message: impl Into<String>, position: usize, query: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Tokenize {
                message: message.into(),
                position,
            },
            query: Some(query.into()),
        }
    }

    /// Creates a compile error.
    pub fn compile(message: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Compile {
                message: message.into(),
            },
            query: None,
        }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the error message without context.
    pub fn message(&self) -> &str {
        match &self.kind {
            QueryErrorKind::Tokenize { message, .. } => message,
            QueryErrorKind::UnbalancedParen { message } => message,
            QueryErrorKind::Compile { message } => message,
            QueryErrorKind::Resolve(err) => &err.message,
        }
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match &self.kind {
            QueryErrorKind::Tokenize { message, .. } if message.contains("unterminated quote") => {
                Some("Add a closing quote (\") to complete the value")
            }
            QueryErrorKind::Tokenize { message, .. } if message.contains("NOT") => {
                Some("NOT must follow AND or OR, e.g. 'a:1 AND NOT b:2'")
            }
            QueryErrorKind::Tokenize { message, .. } if message.contains("expected field:value") => {
                Some("Every condition is written as field:value")
            }
            QueryErrorKind::UnbalancedParen { message } if message.contains("unclosed") => {
                Some("Add a closing parenthesis ) to match the opening one")
            }
            QueryErrorKind::UnbalancedParen { .. } => {
                Some("Remove the extra ) or add a matching (")
            }
            QueryErrorKind::Compile { message } if message.contains("operator") => {
                Some("AND, OR, AND NOT, and OR NOT require conditions on both sides")
            }
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match &self.kind {
            QueryErrorKind::Tokenize { .. } | QueryErrorKind::UnbalancedParen { .. } => {
                "query syntax error"
            }
            QueryErrorKind::Compile { .. } => "query error",
            QueryErrorKind::Resolve(_) => "nested field error",
        };

        match &self.kind {
            QueryErrorKind::Resolve(err) => writeln!(f, "{prefix}: {err}")?,
            _ => writeln!(f, "{}: {}", prefix, self.message())?,
        }

        if let Some(query) = &self.query {
            let position = match &self.kind {
                QueryErrorKind::Tokenize { position, .. } => Some(*position),
                _ => None,
            };

            writeln!(f, "  {}", query)?;
            if let Some(pos) = position {
                let clamped = pos.min(query.len());
                writeln!(f, "  {}^", " ".repeat(clamped))?;
            }
        }

        if let Some(suggestion) = self.suggestion() {
            write!(f, "hint: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            QueryErrorKind::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TokenizeError> for QueryError {
    fn from(err: TokenizeError) -> Self {
        Self {
            kind: QueryErrorKind::Tokenize {
                message: err.message,
                position: err.position,
            },
            query: Some(err.input),
        }
    }
}

impl From<UnbalancedParenError> for QueryError {
    fn from(err: UnbalancedParenError) -> Self {
        Self {
            kind: QueryErrorKind::UnbalancedParen {
                message: err.to_string(),
            },
            query: None,
        }
    }
}

impl From<CompileError> for QueryError {
    fn from(err: CompileError) -> Self {
        Self::compile(err.message)
    }
}

impl From<ResolveError> for QueryError {
    fn from(err: ResolveError) -> Self {
        Self {
            kind: QueryErrorKind::Resolve(err),
            query: None,
        }
    }
}
