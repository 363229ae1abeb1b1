use nom::error::{ContextError, ErrorKind, ParseError as NomParseError};

use crate::attribute::AttributeError;
use crate::model::ModelError;

/// Low-level token error, playing the same role as the teacher's
/// `DbcParseError`: it only needs to satisfy `nom`'s `ParseError` trait so
/// the token-level combinators in [`super::tokens`] can share one error
/// type. Line-level handlers translate a failure here into a
/// [`ParseErrorKind`] that names the grammar element that failed.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("bad integer literal")]
    BadInt,
    #[error("bad float literal")]
    BadFloat,
    #[error("bad string literal")]
    BadString,
    #[error("bad identifier")]
    BadIdentifier,
    #[error("unknown attribute value kind {0:?} (expected STRING/INT/FLOAT/ENUM)")]
    UnknownAttributeKind(String),
    #[error("nom error: {0:?}")]
    Nom(ErrorKind),
}

impl NomParseError<&str> for TokenError {
    fn from_error_kind(_input: &str, kind: ErrorKind) -> Self {
        TokenError::Nom(kind)
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &str, _c: char) -> Self {
        Self::from_error_kind(input, ErrorKind::Char)
    }

    fn or(self, other: Self) -> Self {
        other
    }
}

impl ContextError<&str> for TokenError {
    fn add_context(_input: &str, _ctx: &'static str, other: Self) -> Self {
        other
    }
}

/// What kind of grammar element a line failed to parse as, or why a
/// syntactically valid line was rejected. One crate-level error, per
/// spec §7, covering both the parser's own `ParseError` class and
/// `StructuralError`/`DomainError` raised while building the model.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParseErrorKind {
    #[error("malformed VERSION line")]
    BadVersion,
    #[error("malformed BU_ line")]
    BadNodes,
    #[error("malformed BS_ line")]
    BadBitTiming,
    #[error("malformed BO_ line")]
    BadMessageHeader,
    #[error("BO_ references unknown sending node {0:?}")]
    UnknownSender(String),
    #[error("malformed SG_ line")]
    BadSignal,
    #[error("SG_ line outside of a BO_ block")]
    SignalOutsideMessage,
    #[error("malformed CM_ line")]
    BadComment,
    #[error("malformed BA_DEF_ line")]
    BadAttributeDefinition,
    #[error("unknown attribute value kind {0:?} (expected STRING/INT/FLOAT/ENUM)")]
    UnknownAttributeKind(String),
    #[error("malformed BA_DEF_DEF_ line")]
    BadAttributeDefault,
    #[error("BA_DEF_DEF_ references unknown attribute definition {0:?}")]
    UnknownAttributeDefinition(String),
    #[error("malformed BA_ line")]
    BadAttributeValue,
    #[error("malformed VAL_TABLE_ line")]
    BadValueTable,
    #[error("malformed VAL_ line")]
    BadValueDescription,
    #[error("CM_/BA_/VAL_ line references unknown message can_id {0}")]
    UnknownMessage(u32),
    #[error("CM_/BA_/VAL_ line references unknown node {0:?}")]
    UnknownNode(String),
    #[error("CM_/BA_/VAL_ line references unknown signal {1:?} on message {0}")]
    UnknownSignal(u32, String),
    #[error("unrecognized keyword {0:?} (strict_unknown_keywords is enabled)")]
    UnknownKeyword(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// A [`ParseErrorKind`] together with the 1-based line number it occurred
/// on, the unit of fatality per spec §4.D/§7: a parse error aborts the
/// whole file, it is never recovered from.
#[derive(thiserror::Error, Debug, PartialEq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}
