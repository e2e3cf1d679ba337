//! Error types.

use std::fmt;

use cssparser::{BasicParseError, BasicParseErrorKind, ParseErrorKind};
use thiserror::Error;

/// A short-lived error.
///
/// The lifetime of the error is the same as the `cssparser::ParserInput` that
/// was used to create a `cssparser::Parser`.  That is, it is the lifetime of
/// the string data that is being parsed.
pub type ParseError<'i> = cssparser::ParseError<'i, ValueErrorKind>;

/// A simple error which refers to an attribute's value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueErrorKind {
    /// The value could not be parsed
    Parse(String),

    // The value could be parsed, but is invalid
    Value(String),
}

impl ValueErrorKind {
    pub fn parse_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Parse(s.to_string())
    }

    pub fn value_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Value(s.to_string())
    }
}

impl fmt::Display for ValueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueErrorKind::Parse(ref s) => write!(f, "parse error: {s}"),

            ValueErrorKind::Value(ref s) => write!(f, "invalid value: {s}"),
        }
    }
}

impl<'a> From<BasicParseError<'a>> for ValueErrorKind {
    fn from(e: BasicParseError<'_>) -> ValueErrorKind {
        let BasicParseError { kind, .. } = e;

        let msg = match kind {
            BasicParseErrorKind::UnexpectedToken(_) => "unexpected token",
            BasicParseErrorKind::EndOfInput => "unexpected end of input",
            BasicParseErrorKind::AtRuleInvalid(_) => "invalid @-rule",
            BasicParseErrorKind::AtRuleBodyInvalid => "invalid @-rule body",
            BasicParseErrorKind::QualifiedRuleInvalid => "invalid qualified rule",
        };

        ValueErrorKind::parse_error(msg)
    }
}

impl<'i> From<ParseError<'i>> for ValueErrorKind {
    fn from(e: ParseError<'i>) -> ValueErrorKind {
        match e.kind {
            ParseErrorKind::Basic(kind) => ValueErrorKind::from(BasicParseError {
                kind,
                location: e.location,
            }),
            ParseErrorKind::Custom(v) => v,
        }
    }
}

/// Why [`rename_id`](crate::id_clash::rename_id) refused a new name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("the new id is empty")]
    Empty,

    #[error("the new id \"{0}\" does not start with a letter or digit")]
    InvalidStart(String),

    #[error("the object is a clone or not an element")]
    NoOwnId,
}

/// A per-kind `update` handler that could not complete.
///
/// These are collected into an [`UpdateReport`](crate::update::UpdateReport) instead of
/// stopping the update pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("circular reference through \"{0}\"")]
    CircularReference(String),

    #[error("invalid value for \"{attr}\": {err}")]
    InvalidValue { attr: String, err: ValueErrorKind },
}
