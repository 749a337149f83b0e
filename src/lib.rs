//! # rplib
//!
//! Path-addressed access to the XML run documents that simulation tools
//! exchange. A path like `input.group(tab).number(temperature).current`
//! names an element by tag, position among same-tag elements, and `id`;
//! reads resolve it, writes create whatever it names.
//!
//! ## Quick Start
//!
//! ```
//! use rplib::Library;
//!
//! let mut lib = Library::parse_str("<run><input/></run>").unwrap();
//! lib.put_text("input.number(temperature).current", "300K", false).unwrap();
//! assert_eq!(
//!     lib.get("input.(temperature).current").unwrap().as_deref(),
//!     Some("300K"),
//! );
//! assert_eq!(
//!     lib.to_text(),
//!     "<?xml version=\"1.0\"?>\n<run><input><number id=\"temperature\">\
//!      <current>300K</current></number></input></run>\n",
//! );
//! ```

pub mod encoding;
pub mod error;
pub mod interface;
pub mod library;
pub mod parser;
pub mod path;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use library::{Library, LibraryError, PutValue};
pub use path::{parse_path, Path, PathComponent, PathError};
pub use tree::{Attribute, Document, NodeId};
