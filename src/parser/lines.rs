//! One parser per DBC grammar element from §6: the shape of a line's body,
//! independent of the surrounding mode/dispatch logic in [`super`]. Grounded
//! in `oxibus-rdbc`'s `ast/signal.rs` and `ast/nodes.rs` — `spacey`-delimited
//! tuples mapped straight into small structs, errors swallowed into one
//! variant of [`TokenError`].

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::char;
use nom::combinator::{map, opt};
use nom::multi::{many0, many1, separated_list0};
use nom::sequence::{pair, separated_pair};
use nom::IResult;
use nom::Parser;

use crate::attribute::{AttributeKind, ObjectKind, RawAttributeValue};

use super::tokens::{
    float_body, float_value, identifier, multispacey, quoted_string, semicolon, signed_integer,
    spacey, unsigned_integer,
};

/// Which object a `BA_DEF_`, `BA_`, `CM_` or `VAL_` line names as its target,
/// via the `BU_`/`BO_`/`SG_` tag token.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetRef {
    Network,
    Node(String),
    Message(u32),
    Signal(u32, String),
}

/// Parses the optional `BU_ <node>` / `BO_ <can_id>` / `SG_ <can_id> <name>`
/// prefix shared by `CM_` and `BA_` lines, defaulting to [`TargetRef::Network`].
pub fn target_ref(input: &str) -> IResult<&str, TargetRef, super::error::TokenError> {
    alt((
        map(
            pair(tag("BU_"), spacey(identifier)),
            |(_, node): (_, &str)| TargetRef::Node(node.to_string()),
        ),
        map(
            pair(tag("BO_"), spacey(unsigned_integer)),
            |(_, can_id)| TargetRef::Message(can_id),
        ),
        map(
            (tag("SG_"), spacey(unsigned_integer), spacey(identifier)),
            |(_, can_id, name): (_, _, &str)| TargetRef::Signal(can_id, name.to_string()),
        ),
        map(nom::combinator::success(()), |_| TargetRef::Network),
    ))
    .parse(input)
}

/// Parses the bare `BU_`/`BO_`/`SG_` tag used by `BA_DEF_` to pick the
/// definition's [`ObjectKind`] — no identity, just the keyword.
pub fn object_kind_tag(input: &str) -> IResult<&str, ObjectKind, super::error::TokenError> {
    alt((
        map(tag("BU_"), |_| ObjectKind::Node),
        map(tag("BO_"), |_| ObjectKind::Message),
        map(tag("SG_"), |_| ObjectKind::Signal),
        map(nom::combinator::success(()), |_| ObjectKind::Network),
    ))
    .parse(input)
}

/// Either a quoted string or a bare numeral, deciding `Int` vs `Float` on
/// whether the numeral spells a fractional/exponent part.
pub fn raw_attribute_value(
    input: &str,
) -> IResult<&str, RawAttributeValue, super::error::TokenError> {
    alt((
        map(quoted_string, RawAttributeValue::Str),
        map(float_body, |text: &str| {
            if text.contains('.') || text.contains('e') || text.contains('E') {
                RawAttributeValue::Float(text.parse().unwrap_or(0.0))
            } else {
                RawAttributeValue::Int(text.parse().unwrap_or(0))
            }
        }),
    ))
    .parse(input)
}

pub fn version_line(input: &str) -> IResult<&str, String, super::error::TokenError> {
    let (rest, (_, version)) = pair(multispacey(tag("VERSION")), spacey(quoted_string)).parse(input)?;
    Ok((rest, version))
}

pub fn nodes_line(input: &str) -> IResult<&str, Vec<String>, super::error::TokenError> {
    let (rest, (_, _, names)) = (
        multispacey(tag("BU_")),
        spacey(char(':')),
        many0(spacey(identifier)),
    )
        .parse(input)?;
    Ok((rest, names.into_iter().map(String::from).collect()))
}

pub fn bit_timing_line(input: &str) -> IResult<&str, u32, super::error::TokenError> {
    let (rest, (_, _, speed)) = (
        multispacey(tag("BS_")),
        spacey(char(':')),
        opt(spacey(unsigned_integer)),
    )
        .parse(input)?;
    Ok((rest, speed.unwrap_or(0)))
}

/// The header of a `BO_` line: `BO_ <can_id> <name>: <length> <sender>`.
pub struct MessageHeader {
    pub can_id: u32,
    pub name: String,
    pub length: u32,
    pub sender: String,
}

pub fn message_header_line(input: &str) -> IResult<&str, MessageHeader, super::error::TokenError> {
    let (rest, (_, can_id, name, _, length, sender)) = (
        multispacey(tag("BO_")),
        spacey(unsigned_integer),
        spacey(identifier),
        spacey(char(':')),
        spacey(unsigned_integer),
        spacey(identifier),
    )
        .parse(input)?;
    Ok((
        rest,
        MessageHeader {
            can_id,
            name: name.to_string(),
            length,
            sender: sender.to_string(),
        },
    ))
}

/// The body of a `SG_` line, with fields matched 1:1 onto [`crate::model::Signal`].
pub struct SignalLine {
    pub name: String,
    pub is_multiplexer: bool,
    pub multiplexer_id: Option<u32>,
    pub start_bit: u32,
    pub length: u32,
    pub little_endian: bool,
    pub signed: bool,
    pub factor: f64,
    pub offset: f64,
    pub value_min: f64,
    pub value_max: f64,
    pub unit: String,
    pub receivers: Vec<String>,
}

fn multiplexer_indicator(
    input: &str,
) -> IResult<&str, (bool, Option<u32>), super::error::TokenError> {
    map(
        pair(
            opt(pair(char('m'), unsigned_integer)),
            opt(char('M')),
        ),
        |(mux_id, switch)| (switch.is_some(), mux_id.map(|(_, id)| id)),
    )
    .parse(input)
}

fn endian(input: &str) -> IResult<&str, bool, super::error::TokenError> {
    alt((map(char('1'), |_| true), map(char('0'), |_| false))).parse(input)
}

fn sign(input: &str) -> IResult<&str, bool, super::error::TokenError> {
    alt((map(char('-'), |_| true), map(char('+'), |_| false))).parse(input)
}

pub fn signal_line(input: &str) -> IResult<&str, SignalLine, super::error::TokenError> {
    let (rest, (_, name, (is_mux, mux_id), _, start_bit, _, length, _, little_endian, signed, _, factor_offset, _, min_max, unit, receivers)) =
        (
            multispacey(tag("SG_")),
            spacey(identifier),
            spacey(multiplexer_indicator),
            spacey(char(':')),
            spacey(unsigned_integer),
            spacey(char('|')),
            spacey(unsigned_integer),
            spacey(char('@')),
            spacey(endian),
            spacey(sign),
            spacey(char('(')),
            separated_pair(spacey(float_value), spacey(char(',')), spacey(float_value)),
            spacey(char(')')),
            opt(spacey((
                char('['),
                spacey(float_value),
                spacey(char('|')),
                spacey(float_value),
                spacey(char(']')),
            ))),
            spacey(quoted_string),
            many0(spacey(identifier)),
        )
            .parse(input)?;

    let (value_min, value_max) = match min_max {
        Some((_, min, _, max, _)) => (min, max),
        None => (0.0, 0.0),
    };

    Ok((
        rest,
        SignalLine {
            name: name.to_string(),
            is_multiplexer: is_mux,
            multiplexer_id: mux_id,
            start_bit,
            length,
            little_endian,
            signed,
            factor: factor_offset.0,
            offset: factor_offset.1,
            value_min,
            value_max,
            unit,
            receivers: receivers.into_iter().map(String::from).collect(),
        },
    ))
}

/// The body of a `BA_DEF_` line, minus the trailing `;`.
pub struct AttributeDefinitionLine {
    pub obj_kind: ObjectKind,
    pub name: String,
    pub kind: AttributeKind,
}

/// Any identifier-shaped word, so an unrecognized kind (e.g. `BOOL`) is a
/// distinguishable [`super::error::TokenError::UnknownAttributeKind`]
/// instead of falling through to the generic malformed-line error.
fn attribute_kind_word(input: &str) -> IResult<&str, &str, super::error::TokenError> {
    identifier(input)
}

pub fn attribute_definition_line(
    input: &str,
) -> IResult<&str, AttributeDefinitionLine, super::error::TokenError> {
    let (rest, (_, obj_kind, name, kind_word)) = (
        multispacey(tag("BA_DEF_")),
        spacey(object_kind_tag),
        spacey(quoted_string),
        spacey(attribute_kind_word),
    )
        .parse(input)?;

    let (rest, kind) = match kind_word {
        "STRING" => (rest, AttributeKind::String),
        "INT" => {
            let (rest, (min, max)) =
                pair(spacey(signed_integer), spacey(signed_integer)).parse(rest)?;
            (rest, AttributeKind::Int { min, max })
        }
        "FLOAT" => {
            let (rest, (min, max)) =
                pair(spacey(float_value), spacey(float_value)).parse(rest)?;
            (rest, AttributeKind::Float { min, max })
        }
        "ENUM" => {
            let (rest, values) =
                separated_list0(spacey(char(',')), spacey(quoted_string)).parse(rest)?;
            (rest, AttributeKind::Enum { values })
        }
        other => {
            return Err(nom::Err::Failure(super::error::TokenError::UnknownAttributeKind(
                other.to_string(),
            )));
        }
    };

    let (rest, _) = semicolon(rest)?;
    Ok((
        rest,
        AttributeDefinitionLine {
            obj_kind,
            name: name.to_string(),
            kind,
        },
    ))
}

pub struct AttributeDefaultLine {
    pub name: String,
    pub default: RawAttributeValue,
}

pub fn attribute_default_line(
    input: &str,
) -> IResult<&str, AttributeDefaultLine, super::error::TokenError> {
    let (rest, (_, name, default, _)) = (
        multispacey(tag("BA_DEF_DEF_")),
        spacey(quoted_string),
        spacey(raw_attribute_value),
        semicolon,
    )
        .parse(input)?;
    Ok((
        rest,
        AttributeDefaultLine {
            name: name.to_string(),
            default,
        },
    ))
}

pub struct AttributeValueLine {
    pub name: String,
    pub target: TargetRef,
    pub value: RawAttributeValue,
}

pub fn attribute_value_line(
    input: &str,
) -> IResult<&str, AttributeValueLine, super::error::TokenError> {
    let (rest, (_, name, target, value, _)) = (
        multispacey(tag("BA_")),
        spacey(quoted_string),
        spacey(target_ref),
        spacey(raw_attribute_value),
        semicolon,
    )
        .parse(input)?;
    Ok((
        rest,
        AttributeValueLine {
            name: name.to_string(),
            target,
            value,
        },
    ))
}

pub struct ValueTableLine {
    pub name: String,
    pub entries: Vec<(i64, String)>,
}

fn value_entries(input: &str) -> IResult<&str, Vec<(i64, String)>, super::error::TokenError> {
    many0(pair(spacey(signed_integer), spacey(quoted_string))).parse(input)
}

pub fn value_table_line(input: &str) -> IResult<&str, ValueTableLine, super::error::TokenError> {
    let (rest, (_, name, entries, _)) = (
        multispacey(tag("VAL_TABLE_")),
        spacey(identifier),
        value_entries,
        semicolon,
    )
        .parse(input)?;
    Ok((
        rest,
        ValueTableLine {
            name: name.to_string(),
            entries,
        },
    ))
}

pub enum ValueDescriptionSource {
    Inline(Vec<(i64, String)>),
    Named(String),
}

pub struct ValueDescriptionLine {
    pub can_id: u32,
    pub signal_name: String,
    pub source: ValueDescriptionSource,
}

pub fn value_description_line(
    input: &str,
) -> IResult<&str, ValueDescriptionLine, super::error::TokenError> {
    let (rest, (_, can_id, signal_name, source, _)) = (
        multispacey(tag("VAL_")),
        spacey(unsigned_integer),
        spacey(identifier),
        alt((
            map(many1(pair(spacey(signed_integer), spacey(quoted_string))), |entries| {
                ValueDescriptionSource::Inline(entries)
            }),
            map(spacey(identifier), |name: &str| {
                ValueDescriptionSource::Named(name.to_string())
            }),
        )),
        semicolon,
    )
        .parse(input)?;
    Ok((
        rest,
        ValueDescriptionLine {
            can_id,
            signal_name: signal_name.to_string(),
            source,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line_01() {
        let (_, v) = version_line(r#"VERSION "1.0""#).unwrap();
        assert_eq!(v, "1.0");
    }

    #[test]
    fn test_nodes_line_01() {
        let (_, names) = nodes_line("BU_: ABS DRS ECU").unwrap();
        assert_eq!(names, vec!["ABS", "DRS", "ECU"]);
    }

    #[test]
    fn test_bit_timing_line_01() {
        let (_, speed) = bit_timing_line("BS_: 500000").unwrap();
        assert_eq!(speed, 500000);
    }

    #[test]
    fn test_message_header_line_01() {
        let (_, header) = message_header_line("BO_ 100 EngineData: 8 ECU").unwrap();
        assert_eq!(header.can_id, 100);
        assert_eq!(header.name, "EngineData");
        assert_eq!(header.length, 8);
        assert_eq!(header.sender, "ECU");
    }

    // S3
    #[test]
    fn test_signal_line_01() {
        let (_, sig) =
            signal_line(r#"SG_ Speed : 32|32@1+ (33.3,0) [0|100] "%" Node1 Node2"#).unwrap();
        assert_eq!(sig.name, "Speed");
        assert_eq!(sig.start_bit, 32);
        assert_eq!(sig.length, 32);
        assert!(sig.little_endian);
        assert!(!sig.signed);
        assert_eq!(sig.factor, 33.3);
        assert_eq!(sig.offset, 0.0);
        assert_eq!(sig.value_min, 0.0);
        assert_eq!(sig.value_max, 100.0);
        assert_eq!(sig.unit, "%");
        assert_eq!(sig.receivers, vec!["Node1", "Node2"]);
    }

    #[test]
    fn test_signal_line_multiplexer_switch() {
        let (_, sig) = signal_line(r#"SG_ Mux M : 0|2@1+ (1,0) [0|0] "" Vector__XXX"#).unwrap();
        assert!(sig.is_multiplexer);
        assert_eq!(sig.multiplexer_id, None);
    }

    #[test]
    fn test_signal_line_multiplexed_signal() {
        let (_, sig) = signal_line(r#"SG_ Data m0 : 8|8@1+ (1,0) [0|0] "" Vector__XXX"#).unwrap();
        assert!(!sig.is_multiplexer);
        assert_eq!(sig.multiplexer_id, Some(0));
    }

    #[test]
    fn test_attribute_definition_line_int() {
        let (_, def) = attribute_definition_line(r#"BA_DEF_ SG_ "Prio" INT 0 10;"#).unwrap();
        assert_eq!(def.obj_kind, ObjectKind::Signal);
        assert_eq!(def.name, "Prio");
        assert_eq!(def.kind, AttributeKind::Int { min: 0, max: 10 });
    }

    #[test]
    fn test_attribute_definition_line_enum() {
        let (_, def) =
            attribute_definition_line(r#"BA_DEF_ BO_ "MsgType" ENUM "cyclic","event";"#).unwrap();
        assert_eq!(
            def.kind,
            AttributeKind::Enum {
                values: vec!["cyclic".into(), "event".into()]
            }
        );
    }

    #[test]
    fn test_attribute_definition_line_unknown_kind() {
        match attribute_definition_line(r#"BA_DEF_ SG_ "Prio" BOOL;"#) {
            Err(nom::Err::Failure(super::super::error::TokenError::UnknownAttributeKind(word))) => {
                assert_eq!(word, "BOOL");
            }
            Ok(_) => panic!("expected an UnknownAttributeKind failure"),
            Err(_) => panic!("expected UnknownAttributeKind, got a different error"),
        }
    }

    // S5
    #[test]
    fn test_attribute_default_line_01() {
        let (_, default) = attribute_default_line(r#"BA_DEF_DEF_ "Prio" 5;"#).unwrap();
        assert_eq!(default.name, "Prio");
        assert_eq!(default.default, RawAttributeValue::Int(5));
    }

    #[test]
    fn test_attribute_value_line_on_signal() {
        let (_, val) =
            attribute_value_line(r#"BA_ "Prio" SG_ 100 Speed 9;"#).unwrap();
        assert_eq!(val.name, "Prio");
        assert_eq!(val.target, TargetRef::Signal(100, "Speed".into()));
        assert_eq!(val.value, RawAttributeValue::Int(9));
    }

    #[test]
    fn test_value_table_line_01() {
        let (_, table) = value_table_line(r#"VAL_TABLE_ Gear 0 "Park" 1 "Drive" ;"#).unwrap();
        assert_eq!(table.name, "Gear");
        assert_eq!(
            table.entries,
            vec![(0, "Park".to_string()), (1, "Drive".to_string())]
        );
    }

    #[test]
    fn test_value_description_line_inline() {
        let (_, val) = value_description_line(r#"VAL_ 100 Gear 0 "Park" 1 "Drive" ;"#).unwrap();
        assert_eq!(val.can_id, 100);
        assert_eq!(val.signal_name, "Gear");
        match val.source {
            ValueDescriptionSource::Inline(entries) => assert_eq!(entries.len(), 2),
            ValueDescriptionSource::Named(_) => panic!("expected inline entries"),
        }
    }

    #[test]
    fn test_value_description_line_named() {
        let (_, val) = value_description_line(r#"VAL_ 100 Gear GearTable ;"#).unwrap();
        match val.source {
            ValueDescriptionSource::Named(name) => assert_eq!(name, "GearTable"),
            ValueDescriptionSource::Inline(_) => panic!("expected a table reference"),
        }
    }
}
