//! Annotation parsing
//!
//! An annotation is a comment line starting with an `@tag`, e.g.
//! `// @required` or `// @security oauth2 pet:read`. Each line is lexed into
//! tokens and parsed into one [`Directive`]. Lines without a leading tag are
//! plain description text.

pub mod lexer;
pub mod parser;

use std::fmt;

pub use parser::parse;

/// A parsed annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Required,
    Nullable,
    Ignore,
    Deprecated,
    /// Request content type
    Consume(String),
    /// Response content type
    Produce(String),
    /// Operation tag (`@tag` or `@tags`), words joined by spaces
    Tag(String),
    Description(String),
    Summary(String),
    Id(String),
    Security { name: String, params: Vec<String> },
    /// Any other tag, kept for framework plugins to interpret
    Unresolved { tag: String, tokens: Vec<String> },
}

/// Lexical or grammar error in an annotation line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    UnexpectedInput { position: usize, rest: String },
    MissingArgument { tag: String, expected: &'static str },
}

impl fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnnotationError::UnexpectedInput { position, rest } => {
                write!(f, "unexpected input at {}: {:?}", position, rest)
            }
            AnnotationError::MissingArgument { tag, expected } => {
                write!(f, "{} expects an {} argument", tag, expected)
            }
        }
    }
}

impl std::error::Error for AnnotationError {}
