//! How `element` and `children` report the nodes they find.

use std::fmt;
use std::str::FromStr;

use crate::tree::{Document, NodeId};

use super::naming;
use super::LibraryError;

/// The form in which a found element is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultFlavor {
    /// The node handle itself.
    #[default]
    Node,
    /// The `id` attribute, or `tag` / `tagN` without one.
    Id,
    /// The tag name.
    Type,
    /// The component name, `tag(id)` or `tagN`.
    Component,
    /// The dotted path from the document's root element.
    Path,
}

impl ResultFlavor {
    /// Renders `node` in this flavor.
    ///
    /// Returns `None` for non-element nodes in any flavor but `Node`.
    #[must_use]
    pub fn apply(self, doc: &Document, node: NodeId) -> Option<Flavored> {
        let text = match self {
            Self::Node => return Some(Flavored::Node(node)),
            Self::Id => naming::node_id(doc, node),
            Self::Type => doc.node_name(node).map(str::to_string),
            Self::Component => naming::component_name(doc, node),
            Self::Path => naming::node_path(doc, node),
        };
        text.map(Flavored::Text)
    }
}

impl FromStr for ResultFlavor {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" | "node" => Ok(Self::Node),
            "id" => Ok(Self::Id),
            "type" => Ok(Self::Type),
            "component" => Ok(Self::Component),
            "path" => Ok(Self::Path),
            other => Err(LibraryError::argument(format!(
                "bad flavor '{other}': should be object, id, type, component or path"
            ))),
        }
    }
}

impl fmt::Display for ResultFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Node => "object",
            Self::Id => "id",
            Self::Type => "type",
            Self::Component => "component",
            Self::Path => "path",
        })
    }
}

/// A found element in the requested [`ResultFlavor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flavored {
    /// A node handle into the library's document.
    Node(NodeId),
    /// A name or path.
    Text(String),
}

impl Flavored {
    /// The node handle, for the `Node` flavor.
    #[must_use]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            Self::Text(_) => None,
        }
    }

    /// The text, for every flavor but `Node`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Node(_) => None,
        }
    }
}
