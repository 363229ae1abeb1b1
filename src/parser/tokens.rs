//! Token-level `nom` combinators shared by the line handlers. Grounded in
//! `oxibus-rdbc`'s `ast/common_parsers.rs` and `ast/char_string.rs` — same
//! `spacey`/`multispacey` idiom, same float/int grammar, ported onto our own
//! [`TokenError`].

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, multispace0, one_of, space0};
use nom::combinator::{opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair};
use nom::IResult;
use nom::Parser;

use super::error::TokenError;

pub fn spacey<'a, O>(
    f: impl Parser<&'a str, Output = O, Error = TokenError>,
) -> impl Parser<&'a str, Output = O, Error = TokenError> {
    delimited(space0, f, space0)
}

pub fn multispacey<'a, O>(
    f: impl Parser<&'a str, Output = O, Error = TokenError>,
) -> impl Parser<&'a str, Output = O, Error = TokenError> {
    delimited(multispace0, f, multispace0)
}

fn digit1to9(input: &str) -> IResult<&str, char, TokenError> {
    one_of("123456789").parse(input)
}

// `nom::character::complete::digit0` mis-slices the remainder when it
// consumes the whole input (a bug in `<str as Input>::split_at_position_complete`'s
// no-match branch: it returns the remainder at offset 0 instead of offset
// `len`), which corrupts `recognize`'s `Offset`-based span computation.
// `take_while` doesn't go through that path, so we use it instead.
fn uint_body(input: &str) -> IResult<&str, &str, TokenError> {
    alt((
        tag("0"),
        recognize(pair(digit1to9, take_while(|c: char| c.is_ascii_digit()))),
    ))
    .parse(input)
}

/// An identifier: DBC object names are C-ish (letters, digits, underscore,
/// starting with a letter or underscore).
pub fn identifier(input: &str) -> IResult<&str, &str, TokenError> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

pub fn unsigned_integer(input: &str) -> IResult<&str, u32, TokenError> {
    let (remain, digits) = uint_body(input)?;
    digits
        .parse::<u32>()
        .map(|v| (remain, v))
        .map_err(|_| nom::Err::Error(TokenError::BadInt))
}

pub fn signed_integer(input: &str) -> IResult<&str, i64, TokenError> {
    let (remain, text) = recognize(pair(opt(char('-')), uint_body)).parse(input)?;
    text.parse::<i64>()
        .map(|v| (remain, v))
        .map_err(|_| nom::Err::Error(TokenError::BadInt))
}

pub(crate) fn float_body(input: &str) -> IResult<&str, &str, TokenError> {
    recognize((
        opt(char('-')),
        uint_body,
        opt(pair(char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// A floating-point literal, accepting plain integers too (`factor`/`offset`
/// in the grammar are frequently written without a decimal point).
pub fn float_value(input: &str) -> IResult<&str, f64, TokenError> {
    let (remain, text) = float_body(input)?;
    text.parse::<f64>()
        .map(|v| (remain, v))
        .map_err(|_| nom::Err::Error(TokenError::BadFloat))
}

/// A double-quoted string, with `\"` recognized as an escaped quote.
pub fn quoted_string(input: &str) -> IResult<&str, String, TokenError> {
    let (remain, body) = delimited(
        char('"'),
        recognize(many0(alt((
            recognize(pair(char('\\'), nom::character::complete::anychar)),
            recognize(nom::character::complete::none_of("\"")),
        )))),
        char('"'),
    )
    .parse(input)
    .map_err(|_: nom::Err<TokenError>| nom::Err::Error(TokenError::BadString))?;
    Ok((remain, body.replace("\\\"", "\"")))
}

pub fn semicolon(input: &str) -> IResult<&str, char, TokenError> {
    spacey(char(';')).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_01() {
        assert_eq!(identifier("ABS_Node1 rest"), Ok((" rest", "ABS_Node1")));
    }

    #[test]
    fn test_unsigned_integer_01() {
        assert_eq!(unsigned_integer("117 rest"), Ok((" rest", 117)));
    }

    #[test]
    fn test_signed_integer_negative() {
        assert_eq!(signed_integer("-42"), Ok(("", -42)));
    }

    #[test]
    fn test_float_value_plain_int() {
        assert_eq!(float_value("100"), Ok(("", 100.0)));
    }

    #[test]
    fn test_float_value_decimal() {
        assert_eq!(float_value("0.005"), Ok(("", 0.005)));
    }

    #[test]
    fn test_float_value_negative_decimal() {
        assert_eq!(float_value("-163.84"), Ok(("", -163.84)));
    }

    #[test]
    fn test_float_value_exponent() {
        assert_eq!(float_value("1.5e-05"), Ok(("", 1.5e-05)));
    }

    #[test]
    fn test_quoted_string_plain() {
        assert_eq!(quoted_string("\"hello\""), Ok(("", "hello".to_string())));
    }

    #[test]
    fn test_quoted_string_escaped_quote() {
        assert_eq!(
            quoted_string(r#""say \"hi\"""#),
            Ok(("", "say \"hi\"".to_string()))
        );
    }
}
