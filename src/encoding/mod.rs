//! Encoding of binary payloads stored as element text.
//!
//! Values that cannot live in a text node as-is are stored behind a header
//! line naming how the rest was produced:
//!
//! | scheme      | header             | payload                 |
//! |-------------|--------------------|-------------------------|
//! | `Raw`       | none               | the bytes unchanged     |
//! | `Zip`       | `@@RP-ENC:z\n`     | gzip stream             |
//! | `Base64`    | `@@RP-ENC:b64\n`   | base64 text             |
//! | `ZipBase64` | `@@RP-ENC:zb64\n`  | base64 of a gzip stream |
//!
//! Base64 text is wrapped at 76 columns and ends with a newline. Decoding
//! ignores whitespace inside base64 text, and data without a header decodes
//! to itself.
//!
//! ```
//! use rplib::encoding::{decode, encode_text, Scheme};
//!
//! let text = encode_text(b"\x00\x01binary", Scheme::ZipBase64).unwrap();
//! assert!(text.starts_with("@@RP-ENC:zb64\n"));
//! assert_eq!(decode(text.as_bytes()).unwrap(), b"\x00\x01binary");
//! ```

use std::fmt;
use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::parser::input::is_xml_char;

/// Prefix shared by every encoding header.
pub const SENTINEL: &str = "@@RP-ENC:";

const LINE_WIDTH: usize = 76;

/// How a payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Stored unchanged, without a header.
    Raw,
    /// Gzip-compressed.
    Zip,
    /// Base64 text.
    Base64,
    /// Gzip-compressed, then base64.
    ZipBase64,
}

impl Scheme {
    fn compresses(self) -> bool {
        matches!(self, Self::Zip | Self::ZipBase64)
    }

    fn is_base64(self) -> bool {
        matches!(self, Self::Base64 | Self::ZipBase64)
    }
}

/// An error decoding or encoding a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The data starts with the sentinel but the header is not one of the
    /// known ones.
    BadHeader(String),
    /// The base64 text is invalid.
    Base64(String),
    /// The gzip stream is invalid or could not be produced.
    Gzip(String),
    /// The encoded result is not valid UTF-8 and cannot be stored as text.
    NotText,
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadHeader(header) => write!(f, "unknown encoding header '{header}'"),
            Self::Base64(msg) => write!(f, "invalid base64 payload: {msg}"),
            Self::Gzip(msg) => write!(f, "invalid gzip payload: {msg}"),
            Self::NotText => f.write_str("encoded payload is not valid UTF-8 text"),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Returns the header line written for `scheme`, if any.
#[must_use]
pub fn header(scheme: Scheme) -> Option<&'static str> {
    match scheme {
        Scheme::Raw => None,
        Scheme::Zip => Some("@@RP-ENC:z\n"),
        Scheme::Base64 => Some("@@RP-ENC:b64\n"),
        Scheme::ZipBase64 => Some("@@RP-ENC:zb64\n"),
    }
}

/// Returns `true` if `data` starts with the encoding sentinel.
#[must_use]
pub fn is_encoded(data: &[u8]) -> bool {
    data.starts_with(SENTINEL.as_bytes())
}

/// Returns `true` if `data` cannot be stored verbatim as element text:
/// it is not UTF-8, holds characters XML cannot represent, or holds
/// control characters other than tab, newline and carriage return.
#[must_use]
pub fn is_binary(data: &[u8]) -> bool {
    match std::str::from_utf8(data) {
        Ok(text) => text.chars().any(|c| {
            !is_xml_char(c) || (c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        }),
        Err(_) => true,
    }
}

/// Determines the scheme of `data` from its header.
///
/// Returns the scheme and the header length.
///
/// # Errors
///
/// Returns [`EncodingError::BadHeader`] if `data` starts with the sentinel
/// but no known header.
pub fn detect(data: &[u8]) -> Result<(Scheme, usize), EncodingError> {
    if !is_encoded(data) {
        return Ok((Scheme::Raw, 0));
    }
    for scheme in [Scheme::Zip, Scheme::Base64, Scheme::ZipBase64] {
        if let Some(h) = header(scheme) {
            if data.starts_with(h.as_bytes()) {
                return Ok((scheme, h.len()));
            }
        }
    }
    let line_end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
    Err(EncodingError::BadHeader(
        String::from_utf8_lossy(&data[..line_end]).into_owned(),
    ))
}

/// Encodes `data` with `scheme`, header included.
///
/// Empty input is returned unchanged for every scheme.
///
/// # Errors
///
/// Returns [`EncodingError::Gzip`] if compression fails.
pub fn encode(data: &[u8], scheme: Scheme) -> Result<Vec<u8>, EncodingError> {
    if data.is_empty() || scheme == Scheme::Raw {
        return Ok(data.to_vec());
    }

    let mut payload = if scheme.compresses() {
        gzip(data)?
    } else {
        data.to_vec()
    };
    if scheme.is_base64() {
        payload = wrap_base64(&STANDARD.encode(&payload)).into_bytes();
    }

    let mut out = Vec::with_capacity(payload.len() + 16);
    if let Some(h) = header(scheme) {
        out.extend_from_slice(h.as_bytes());
    }
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Encodes `data` with `scheme` into a string suitable for a text node.
///
/// # Errors
///
/// Returns [`EncodingError::NotText`] if the result is not UTF-8, which
/// happens for `Zip` and for `Raw` binary input.
pub fn encode_text(data: &[u8], scheme: Scheme) -> Result<String, EncodingError> {
    String::from_utf8(encode(data, scheme)?).map_err(|_| EncodingError::NotText)
}

/// Decodes `data` according to its header.
///
/// # Errors
///
/// Returns an error if the header is unknown or the payload is corrupt.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let (scheme, skip) = detect(data)?;
    let mut payload = data[skip..].to_vec();
    if scheme.is_base64() {
        let compact: Vec<u8> = payload
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        payload = STANDARD
            .decode(compact)
            .map_err(|e| EncodingError::Base64(e.to_string()))?;
    }
    if scheme.compresses() {
        payload = gunzip(&payload)?;
    }
    Ok(payload)
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| EncodingError::Gzip(e.to_string()))?;
    encoder.finish().map_err(|e| EncodingError::Gzip(e.to_string()))
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| EncodingError::Gzip(e.to_string()))?;
    Ok(out)
}

fn wrap_base64(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / LINE_WIDTH + 1);
    // Base64 output is ASCII, so byte chunks are char boundaries.
    for line in text.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}
