//! Node type definitions.
//!
//! The `NodeKind` enum represents the node types a run document can hold.
//! Each variant carries the node-type-specific payload (element name and
//! attributes, text content). Navigation links live in `NodeData`.

use super::Attribute;

/// The kind of a document node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node, e.g., `<string id="t">`.
    Element {
        /// The element's tag name, kept verbatim (prefixes included).
        name: String,
        /// Attributes in source order.
        attributes: Vec<Attribute>,
    },

    /// A text node containing character data (references already decoded).
    Text {
        /// The text content.
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text without the delimiters.
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },
}

impl NodeKind {
    /// Shorthand for an element with no attributes.
    #[must_use]
    pub fn element(name: impl Into<String>) -> Self {
        Self::Element {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Shorthand for a text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }
}
