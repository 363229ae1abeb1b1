//! Best-effort multi-encoding file reading, for DBC files exported by tools
//! that don't write UTF-8. Grounded in `oxibus-rdbc`'s `file.rs`, ported from
//! its `anyhow`-based `Result` (an app-level concern, scoped to its CLI
//! feature) onto a dedicated error type.

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} could not be decoded as UTF-8, GBK, or Windows-1252")]
    UndecodableEncoding { path: String },
}

fn try_decode(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (cow, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(cow.into_owned())
    }
}

/// Reads `path` as text, trying UTF-8 first and falling back to GBK then
/// Windows-1252 — the three encodings DBC files are encountered in out in
/// the wild.
pub fn read_file_content(path: impl AsRef<Path>) -> Result<String, ReadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    try_decode(&bytes, UTF_8)
        .or_else(|| try_decode(&bytes, GBK))
        .or_else(|| try_decode(&bytes, WINDOWS_1252))
        .ok_or_else(|| ReadError::UndecodableEncoding {
            path: path.display().to_string(),
        })
}
