//! Typed attribute definitions, concrete attribute values, and the per-object
//! container that resolves a key to a value, walking the parent chain to a
//! definition's default when nothing closer is set.
//!
//! Grounded in `canpy/can_objects/can_attribute.py`'s `CANAttributeDefinition`
//! family and `CANAttributesContainer` lookup chain.

use std::collections::HashMap;
use std::fmt;

/// Which kind of model object an [`AttributeDefinition`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    Network,
    Node,
    Message,
    Signal,
}

/// A concrete, typed value an attribute can hold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Enum(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Enum(s) => write!(f, "{s}"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AttributeError {
    #[error("attribute value not allowed by its definition")]
    InvalidValue,
    #[error("enum index out of range")]
    EnumIndexOutOfRange,
    #[error("no attribute or default available for this key")]
    LookupMiss,
}

/// Anything that can be fed into [`AttributeDefinition::check_and_cast`].
///
/// Mirrors the DBC grammar, which only ever hands the parser a number or a
/// quoted string for an attribute's value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttributeValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for RawAttributeValue {
    fn from(s: &str) -> Self {
        RawAttributeValue::Str(s.to_string())
    }
}
impl From<i64> for RawAttributeValue {
    fn from(v: i64) -> Self {
        RawAttributeValue::Int(v)
    }
}
impl From<f64> for RawAttributeValue {
    fn from(v: f64) -> Self {
        RawAttributeValue::Float(v)
    }
}

/// The variant-specific shape of an attribute definition: acceptable raw
/// inputs, validation, and casting to the stored [`AttributeValue`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeKind {
    String,
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Enum { values: Vec<String> },
}

impl AttributeKind {
    /// Validates and casts `raw` per the table in spec §4.B. Unbounded
    /// ranges (`min == max == 0`) accept anything castable.
    pub fn check_and_cast(&self, raw: &RawAttributeValue) -> Result<AttributeValue, AttributeError> {
        match self {
            AttributeKind::String => Ok(AttributeValue::String(match raw {
                RawAttributeValue::Str(s) => s.clone(),
                RawAttributeValue::Int(i) => i.to_string(),
                RawAttributeValue::Float(f) => f.to_string(),
            })),
            AttributeKind::Int { min, max } => {
                let v = as_i64(raw).ok_or(AttributeError::InvalidValue)?;
                if (*min == 0 && *max == 0) || (*min <= v && v <= *max) {
                    Ok(AttributeValue::Int(v))
                } else {
                    Err(AttributeError::InvalidValue)
                }
            }
            AttributeKind::Float { min, max } => {
                let v = as_f64(raw).ok_or(AttributeError::InvalidValue)?;
                if (*min == 0.0 && *max == 0.0) || (*min <= v && v <= *max) {
                    Ok(AttributeValue::Float(v))
                } else {
                    Err(AttributeError::InvalidValue)
                }
            }
            AttributeKind::Enum { values } => match raw {
                RawAttributeValue::Str(s) if values.contains(s) => {
                    Ok(AttributeValue::Enum(s.clone()))
                }
                RawAttributeValue::Int(i) => {
                    if *i < 0 {
                        return Err(AttributeError::EnumIndexOutOfRange);
                    }
                    values
                        .get(*i as usize)
                        .cloned()
                        .map(AttributeValue::Enum)
                        .ok_or(AttributeError::EnumIndexOutOfRange)
                }
                _ => Err(AttributeError::InvalidValue),
            },
        }
    }
}

fn as_i64(raw: &RawAttributeValue) -> Option<i64> {
    match raw {
        RawAttributeValue::Int(i) => Some(*i),
        RawAttributeValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        RawAttributeValue::Str(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_f64(raw: &RawAttributeValue) -> Option<f64> {
    match raw {
        RawAttributeValue::Int(i) => Some(*i as f64),
        RawAttributeValue::Float(f) => Some(*f),
        RawAttributeValue::Str(s) => s.parse().ok(),
    }
}

/// A named, typed attribute definition scoped to one [`ObjectKind`], carrying
/// an optional validated default.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeDefinition {
    pub name: String,
    pub obj_type: ObjectKind,
    pub kind: AttributeKind,
    default: Option<AttributeValue>,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, obj_type: ObjectKind, kind: AttributeKind) -> Self {
        AttributeDefinition {
            name: name.into(),
            obj_type,
            kind,
            default: None,
        }
    }

    pub fn default(&self) -> Option<&AttributeValue> {
        self.default.as_ref()
    }

    /// Sets the default through the same cast/check rules as any other
    /// value; an invalid default is dropped (left `None`), per spec §4.B.
    pub fn set_default(&mut self, raw: &RawAttributeValue) {
        self.default = self.kind.check_and_cast(raw).ok();
    }
}

/// A concrete attribute attached to one model object: a reference to its
/// definition's name plus an optional value override.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

/// Per-object store of locally set attributes; only the [`Network`]'s
/// container meaningfully holds definitions (`add_definition` is a no-op
/// elsewhere, matching spec §4.B).
///
/// [`Network`]: crate::model::Network
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeContainer {
    attributes: HashMap<String, Attribute>,
    definitions: HashMap<String, AttributeDefinition>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: Attribute) {
        self.attributes.insert(attribute.name.clone(), attribute);
    }

    pub fn add_definition(&mut self, definition: AttributeDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.definitions.get(name)
    }

    pub fn definition_mut(&mut self, name: &str) -> Option<&mut AttributeDefinition> {
        self.definitions.get_mut(name)
    }

    /// Local lookup only — step 1 of the chain in spec §4.B. Callers that
    /// need default inheritance use [`crate::model::resolve_attribute`].
    pub fn local(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
