//! Error types, diagnostics, and result aliases for the translator.
//!
//! Every failure is a variant of [`PseudomapError`], rendered via `miette` diagnostics.
//! All of them are local to one row: the driver counts and reports them and moves on.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::lexer::token::SourceLocation;

/// Main error type for the translator
#[derive(Error, Debug, Diagnostic)]
pub enum PseudomapError {
    #[error("unexpected token")]
    #[diagnostic(code(E0001), help("{help}"))]
    UnexpectedToken {
        #[source_code]
        src: String,
        #[label("expected {expected}, found {found}")]
        span: SourceSpan,
        expected: String,
        found: String,
        help: String,
    },

    #[error("both branches of a conditional are conditionals")]
    #[diagnostic(
        code(E0002),
        help("only one of the then/else branches may itself be a conditional; move one of them into its own row")
    )]
    NestedBranches {
        #[source_code]
        src: String,
        #[label("conditional starts here")]
        span: SourceSpan,
    },

    #[error("maximum nesting depth exceeded")]
    #[diagnostic(code(E0003), help("{help}"))]
    RecursionLimitExceeded {
        #[source_code]
        src: String,
        #[label("nesting too deep here")]
        span: SourceSpan,
        help: String,
    },

    #[error("illegal character '{ch}'")]
    #[diagnostic(code(E0004), severity(Warning), help("the character was skipped"))]
    IllegalCharacter {
        #[source_code]
        src: String,
        #[label("'{ch}' matches no token")]
        span: SourceSpan,
        ch: char,
    },

    #[error("could not match fields 6-13")]
    #[diagnostic(
        code(E0101),
        help("a row needs 8 unquoted commas after the value column")
    )]
    MalformedRow { row: String },

    #[error("last row is incomplete")]
    #[diagnostic(
        code(E0102),
        help("a row is complete once it ends with a comma; the input ended before that")
    )]
    IncompleteRow { row: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

impl PseudomapError {
    /// Create an UnexpectedToken error
    pub fn unexpected_token(
        src: impl Into<String>,
        location: &SourceLocation,
        expected: impl Into<String>,
        found: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        PseudomapError::UnexpectedToken {
            src: src.into(),
            span: (location.offset, location.length).into(),
            expected: expected.into(),
            found: found.into(),
            help: help.into(),
        }
    }

    /// Create a NestedBranches error
    pub fn nested_branches(src: impl Into<String>, location: &SourceLocation) -> Self {
        PseudomapError::NestedBranches {
            src: src.into(),
            span: (location.offset, location.length).into(),
        }
    }

    /// Create an IllegalCharacter diagnostic
    pub fn illegal_character(
        src: impl Into<String>,
        location: &SourceLocation,
        ch: char,
    ) -> Self {
        PseudomapError::IllegalCharacter {
            src: src.into(),
            span: (location.offset, location.length).into(),
            ch,
        }
    }

    pub fn malformed_row(row: impl Into<String>) -> Self {
        PseudomapError::MalformedRow { row: row.into() }
    }

    pub fn incomplete_row(row: impl Into<String>) -> Self {
        PseudomapError::IncompleteRow { row: row.into() }
    }

    /// Create an IoError
    pub fn io_error(message: impl Into<String>) -> Self {
        PseudomapError::IoError {
            message: message.into(),
        }
    }

    /// True when the token sequence could not be reduced to a value
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            PseudomapError::UnexpectedToken { .. }
                | PseudomapError::NestedBranches { .. }
                | PseudomapError::RecursionLimitExceeded { .. }
        )
    }

    /// Get a simple error message (without source context)
    pub fn message(&self) -> String {
        match self {
            PseudomapError::UnexpectedToken {
                expected, found, ..
            } => {
                format!("unexpected token: expected {}, found {}", expected, found)
            }
            PseudomapError::NestedBranches { .. } => {
                "both branches of a conditional are conditionals".to_string()
            }
            PseudomapError::RecursionLimitExceeded { .. } => {
                "maximum nesting depth exceeded".to_string()
            }
            PseudomapError::IllegalCharacter { ch, .. } => {
                format!("illegal character '{}'", ch)
            }
            PseudomapError::MalformedRow { row } => {
                format!("could not match fields 6-13: {}", row)
            }
            PseudomapError::IncompleteRow { row } => {
                format!("last row is incomplete: {}", row)
            }
            PseudomapError::IoError { message } => format!("I/O error: {}", message),
        }
    }
}

impl From<std::io::Error> for PseudomapError {
    fn from(err: std::io::Error) -> Self {
        PseudomapError::io_error(err.to_string())
    }
}

/// Result type for translator operations
pub type PseudomapResult<T> = Result<T, PseudomapError>;
