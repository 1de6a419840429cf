use thiserror::Error;

use crate::Position;

/// The result type for the `lexr` crate.
pub type Result<T> = std::result::Result<T, LexrError>;

/// The error type for the `lexr` crate.
#[derive(Error, Debug)]
pub struct LexrError {
    /// The source of the error.
    pub source: Box<LexrErrorKind>,
}

impl LexrError {
    /// Create a new `LexrError`.
    pub fn new(kind: LexrErrorKind) -> Self {
        LexrError {
            source: Box::new(kind),
        }
    }

    /// Create an error reported by a user-supplied action.
    pub fn action<T: Into<String>>(message: T) -> Self {
        LexrError::new(LexrErrorKind::Action(message.into()))
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> &LexrErrorKind {
        &self.source
    }
}

impl std::fmt::Display for LexrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// The error kind type.
#[derive(Error, Debug)]
pub enum LexrErrorKind {
    /// An error occurred during the parsing of the regex syntax.
    #[error("'{1}' {0}")]
    RegexSyntax(regex_syntax::ast::Error, String),

    /// A regex feature that has no counterpart in the pattern algebra.
    #[error("Unsupported regex feature: {0}")]
    UnsupportedFeature(String),

    /// A pattern that can't be compiled, e.g. a malformed character range.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A lexicon specification that can't be compiled, e.g. a duplicate
    /// scanner state name or a `Begin` action referencing an unknown state.
    #[error("Invalid lexicon: {0}")]
    InvalidLexicon(String),

    /// A scanner operation that can't be carried out, e.g. `begin` with an
    /// unknown scanner state name.
    #[error("Invalid scanner operation: {0}")]
    InvalidScanner(String),

    /// No pattern of the current scanner state matches at the cursor.
    #[error("{}: {position}: unrecognized input {symbol:?}", .name.as_deref().unwrap_or("<input>"))]
    UnrecognizedInput {
        /// The name the scanner was created with, if any.
        name: Option<String>,
        /// The position of the first offending character.
        position: Position,
        /// The offending character rendered for diagnostics.
        symbol: String,
    },

    /// A std::io error occurred while reading the input stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A user-supplied action reported an error.
    #[error("Action failed: {0}")]
    Action(String),
}

impl From<std::io::Error> for LexrError {
    fn from(error: std::io::Error) -> Self {
        LexrError::new(LexrErrorKind::Io(error))
    }
}

impl From<regex_syntax::ast::Error> for LexrError {
    fn from(error: regex_syntax::ast::Error) -> Self {
        let pattern = error.pattern().to_string();
        LexrError::new(LexrErrorKind::RegexSyntax(error, pattern))
    }
}
