//! Character set detection for document files.
//!
//! Run files are usually UTF-8, but files written by older tools may carry a
//! BOM or declare a legacy charset. Detection order:
//!
//! 1. A Byte Order Mark selects UTF-8, UTF-16BE or UTF-16LE and is skipped.
//! 2. Without a BOM the bytes are taken as UTF-8.
//! 3. The `encoding=` pseudo-attribute of the declaration overrides the
//!    guess when it names a different charset; `encoding_rs` transcodes.

use crate::error::ParseError;

/// Detects the encoding of a byte stream from its Byte Order Mark.
///
/// Returns the charset label and the number of BOM bytes to skip.
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> (&'static str, usize) {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        ("UTF-8", 3)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        ("UTF-16BE", 2)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        ("UTF-16LE", 2)
    } else {
        ("UTF-8", 0)
    }
}

/// Transcodes `bytes` from the labelled charset into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `ParseError` if the label is unknown to `encoding_rs` or the
/// bytes are malformed for that charset.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, ParseError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ParseError::unlocated(format!("unsupported encoding: {label}")))?;

    let (result, _used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ParseError::unlocated(format!(
            "malformed byte sequence for encoding {label}"
        )));
    }
    Ok(result.into_owned())
}

/// Decodes raw document bytes into UTF-8 text.
///
/// # Errors
///
/// Returns `ParseError` if the bytes are invalid for the detected charset.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, ParseError> {
    let (bom_label, skip) = detect_bom(bytes);
    let content = &bytes[skip..];

    if bom_label == "UTF-8" {
        let declared = declared_encoding(content);
        return match (std::str::from_utf8(content), declared) {
            (Ok(text), Some(label)) if !is_utf8_label(&label) => {
                log::debug!("transcoding document from declared charset {label}");
                transcode(text.as_bytes(), &label)
            }
            (Ok(text), _) => Ok(text.to_string()),
            (Err(_), Some(label)) => transcode(content, &label),
            (Err(_), None) => Err(ParseError::unlocated("input is not valid UTF-8")),
        };
    }

    // UTF-16 with a BOM: the BOM decides the byte order.
    transcode(content, bom_label)
}

/// Scans an ASCII-compatible declaration for `encoding="..."`.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let needle = b"encoding";
    let at = decl.windows(needle.len()).position(|w| w == needle)?;
    let rest = trim_ascii_start(&decl[at + needle.len()..]);
    let rest = trim_ascii_start(rest.strip_prefix(b"=")?);

    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..end];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("UTF8")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_boms() {
        assert_eq!(detect_bom(b"\xEF\xBB\xBF<run/>"), ("UTF-8", 3));
        assert_eq!(detect_bom(b"\xFE\xFF\x00<"), ("UTF-16BE", 2));
        assert_eq!(detect_bom(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
        assert_eq!(detect_bom(b"<run/>"), ("UTF-8", 0));
        assert_eq!(detect_bom(b""), ("UTF-8", 0));
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let text = decode_to_utf8(b"\xEF\xBB\xBF<run/>").unwrap();
        assert_eq!(text, "<run/>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>");
        bytes.extend_from_slice(b"<run>caf\xE9</run>");
        let text = decode_to_utf8(&bytes).unwrap();
        assert!(text.contains("caf\u{e9}"));
    }

    #[test]
    fn test_decode_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<run/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_to_utf8(&bytes).unwrap(), "<run/>");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(decode_to_utf8(&[0x80, 0x81, 0x82]).is_err());
    }

    #[test]
    fn test_transcode_unknown_label() {
        let err = transcode(b"x", "UNKNOWN-ENCODING-42").unwrap_err();
        assert!(err.message.contains("unsupported encoding"));
    }

    #[test]
    fn test_declared_encoding_single_quotes() {
        let label = declared_encoding(b"<?xml version='1.0' encoding='utf-8'?><run/>");
        assert_eq!(label.as_deref(), Some("utf-8"));
        assert_eq!(declared_encoding(b"<run/>"), None);
    }
}
