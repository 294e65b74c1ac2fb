//! File payload encoding for `setp`.
//!
//! Stored values travel as base64 text inside a JSON body. The compact
//! strategy sends the raw file bytes under a caller chosen key. The
//! content-addressed strategy deflates the bytes first and derives the key
//! from their MD5 digest, which the server recomputes after inflating.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use md5::{Digest, Md5};

use crate::error::ClientError;
use crate::models::Result;

pub const DEFAULT_EXTENSION: &str = ".bin";
pub const COMPACT_TYPE: &str = "compact";

/// Body of a `POST set` request, before field names are cased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub key: String,
    pub value: String,
    pub md5sum: Option<String>,
}

/// Lowercase hex MD5 of `content`.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// `<hash><.ext>`, falling back to `.bin` when the file has no extension.
pub fn derive_key(hash: &str, path: &Path) -> String {
    match path.extension() {
        Some(ext) if !ext.is_empty() => format!("{}.{}", hash, ext.to_string_lossy()),
        _ => format!("{}{}", hash, DEFAULT_EXTENSION),
    }
}

/// Raw deflate, no zlib header.
pub fn deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

pub fn inflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Inverse of the server's compact representation: base64, then inflate.
pub fn decode_compact(text: &str) -> Result<Vec<u8>> {
    let deflated = STANDARD
        .decode(text.trim())
        .map_err(|e| ClientError::Decode(format!("invalid base64 value: {}", e)))?;
    inflate(&deflated).map_err(|e| ClientError::Decode(format!("invalid deflate stream: {}", e)))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| ClientError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

pub fn compact_upload(key: &str, path: &Path) -> Result<Upload> {
    let data = read_file(path)?;
    log::debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(Upload {
        key: key.to_owned(),
        value: STANDARD.encode(&data),
        md5sum: None,
    })
}

pub fn content_addressed_upload(path: &Path) -> Result<Upload> {
    let data = read_file(path)?;
    let hash = content_hash(&data);
    let deflated = deflate(&data).map_err(|source| ClientError::FileEncode {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Encoded {}: {} bytes, {} deflated, md5 {}",
        path.display(),
        data.len(),
        deflated.len(),
        hash
    );

    Ok(Upload {
        key: derive_key(&hash, path),
        value: STANDARD.encode(&deflated),
        md5sum: Some(hash),
    })
}
