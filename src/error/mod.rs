//! Error types for document parsing.
//!
//! Parse errors carry line, column, and byte offset information so that a
//! malformed run file can be pointed at precisely. Path and accessor errors
//! live next to the code that raises them ([`crate::path::PathError`],
//! [`crate::library::LibraryError`]).

use std::fmt;

/// Source location within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when document text is not well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates an error that is not tied to a position in the input, such as
    /// a charset problem detected before parsing starts.
    pub(crate) fn unlocated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::default(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "unexpected end of input".to_string(),
            location: SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_unlocated_error_points_at_origin() {
        let err = ParseError::unlocated("input is not valid UTF-8");
        assert_eq!(err.location, SourceLocation::default());
        assert_eq!(err.to_string(), "parse error at 0:0: input is not valid UTF-8");
    }

    #[test]
    fn test_parse_error_is_error_trait() {
        let err = ParseError::unlocated("test");
        let _: &dyn std::error::Error = &err;
    }
}
