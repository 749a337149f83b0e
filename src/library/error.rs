//! Error type for [`Library`](super::Library) operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::encoding::EncodingError;
use crate::error::ParseError;
use crate::path::PathError;

/// Anything that can go wrong while reading, editing or writing a library.
#[derive(Debug)]
pub enum LibraryError {
    /// A file could not be read or written.
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The document text is not well-formed.
    Parse(ParseError),
    /// A path could not be parsed or materialized.
    Path(PathError),
    /// A stored payload could not be encoded or decoded.
    Encoding(EncodingError),
    /// An argument was rejected, such as a missing copy source.
    Argument(String),
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Path(e) => write!(f, "{e}"),
            Self::Encoding(e) => write!(f, "{e}"),
            Self::Argument(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Path(e) => Some(e),
            Self::Encoding(e) => Some(e),
            Self::Argument(_) => None,
        }
    }
}

impl From<ParseError> for LibraryError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<PathError> for LibraryError {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

impl From<EncodingError> for LibraryError {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e)
    }
}
