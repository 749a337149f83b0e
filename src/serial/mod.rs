//! Document serialization.
//!
//! Turns a `Document` tree back into markup text, either exactly as stored
//! (compact) or with element-only content indented.

pub mod xml;

pub use xml::{serialize, serialize_subtree, serialize_with_options, SerializeOptions};
