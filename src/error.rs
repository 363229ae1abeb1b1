//! The crate's top-level error type: a DBC file failed to read, or failed to
//! parse. Per spec §7, the parser itself never retries or recovers — a
//! `ParseError` is fatal to the whole file.

pub use crate::parser::{ParseError, ParseErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "encoding")]
    #[error(transparent)]
    Read(#[from] crate::encoding::ReadError),
    #[cfg(not(feature = "encoding"))]
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
