//! A CAN network database: parses the DBC text format into a
//! Network → Node → Message → Signal model, and converts between engineering
//! values and the packed bit representation that rides on the wire.

pub mod attribute;
pub mod bits;
#[cfg(feature = "encoding")]
pub mod encoding;
pub mod error;
pub mod model;
pub mod parser;

pub use bits::BitVector;
pub use error::Error;
pub use model::{Message, Network, Node, Signal, SignalValue, ValueTable};
pub use parser::{parse_str, parse_str_with_options, ParseError, ParseErrorKind, ParseOptions};

use std::path::Path;

/// Reads and parses a DBC file from `path`, with the default (permissive)
/// [`ParseOptions`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Network, Error> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Reads and parses a DBC file from `path` under the given [`ParseOptions`].
pub fn parse_file_with_options(
    path: impl AsRef<Path>,
    options: ParseOptions,
) -> Result<Network, Error> {
    #[cfg(feature = "encoding")]
    let content = encoding::read_file_content(&path)?;

    #[cfg(not(feature = "encoding"))]
    let content = std::fs::read_to_string(&path).map_err(|source| Error::Read {
        path: path.as_ref().display().to_string(),
        source,
    })?;

    Ok(parse_str_with_options(&content, options)?)
}
