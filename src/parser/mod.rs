//! Document parser.
//!
//! A hand-rolled recursive descent parser that checks well-formedness and
//! builds a [`Document`]. It covers what run files contain: the XML
//! declaration, elements and attributes, character data with the built-in
//! entities and character references, CDATA, comments and processing
//! instructions. A DOCTYPE is accepted and skipped. Prefixed names are kept
//! verbatim, without namespace processing.

pub mod charset;
pub(crate) mod input;
mod xml;

use crate::error::ParseError;
use crate::tree::Document;

use input::DEFAULT_MAX_DEPTH;

/// Parse options.
///
/// ```
/// use rplib::parser::ParseOptions;
///
/// let opts = ParseOptions::default().no_blanks(true).max_depth(64);
/// assert_eq!(opts.max_depth, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// If true, drop whitespace-only text nodes.
    pub no_blanks: bool,
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }
}

/// Parses document text with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses document text with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed or nests deeper
/// than `options.max_depth`.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    xml::XmlParser::new(input, options).parse()
}

/// Parses raw bytes, detecting the charset first.
///
/// # Errors
///
/// Returns `ParseError` if the bytes cannot be decoded or the decoded text
/// is not well-formed.
pub fn parse_bytes(input: &[u8]) -> Result<Document, ParseError> {
    parse_bytes_with_options(input, &ParseOptions::default())
}

/// Parses raw bytes with the given options, detecting the charset first.
///
/// # Errors
///
/// Returns `ParseError` if the bytes cannot be decoded or the decoded text
/// is not well-formed.
pub fn parse_bytes_with_options(input: &[u8], options: &ParseOptions) -> Result<Document, ParseError> {
    let text = charset::decode_to_utf8(input)?;
    parse_str_with_options(&text, options)
}
