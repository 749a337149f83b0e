//! Arena-based document tree.
//!
//! Every node of a `Document` lives in one `Vec<NodeData>` and is named by
//! a `NodeId`, a `NonZeroU32` index into it. Parent, child and sibling
//! links are indices too, so the tree holds no reference cycles.
//!
//! Detaching a node unlinks it but leaves it allocated until the document
//! is dropped. Subtrees cross documents by deep copy
//! ([`Document::import_subtree`], [`Document::extract`]), never by sharing.

mod node;

pub use node::NodeKind;

use crate::error::ParseError;
use std::num::NonZeroU32;

/// Index of a node in its document's arena.
///
/// A `NodeId` means nothing to any other `Document`. `Option<NodeId>` is
/// the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// # Panics
    ///
    /// Panics if `index` is 0 or exceeds `u32::MAX`.
    #[allow(clippy::expect_used)]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).expect("node arena exceeds u32::MAX entries");
        Self(NonZeroU32::new(raw).expect("node index 0 is reserved"))
    }

    fn index(self) -> usize {
        self.0.get() as usize
    }
}

/// One arena slot: the node payload and its tree links.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
}

impl From<NodeKind> for NodeData {
    fn from(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// A `name="value"` pair on an element. The value has references expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A document tree.
///
/// Reading goes through `&Document` and editing through `&mut Document`.
///
/// # Examples
///
/// ```
/// use rplib::Document;
///
/// let doc = Document::parse_str("<run><input/></run>").unwrap();
/// let run = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(run), Some("run"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// Slot 0 is never used, so every `NodeId` is non-zero.
    nodes: Vec<NodeData>,
    root: NodeId,
    /// `version` of the XML declaration.
    pub version: Option<String>,
    /// `encoding` of the XML declaration.
    pub encoding: Option<String>,
    /// `standalone` of the XML declaration.
    pub standalone: Option<bool>,
}

impl Document {
    /// Creates a document holding only the document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeKind::Document.into(), NodeKind::Document.into()],
            root: NodeId::from_index(1),
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Creates a document whose root element is an empty `<name/>`.
    #[must_use]
    pub fn with_root_element(name: &str) -> Self {
        let mut doc = Self::new();
        let elem = doc.create_element(name);
        doc.append_child(doc.root, elem);
        doc
    }

    /// Parses document text with default options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        crate::parser::parse_str(input)
    }

    /// The document node. Its element child is [`Document::root_element`].
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.element_children(self.root).next()
    }

    /// # Panics
    ///
    /// Panics if `id` belongs to another document with a larger arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    /// Returns `true` if `id` indexes this document's arena.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// The tag of an element; `None` for other nodes.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    fn text_of(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => Some(content),
            _ => None,
        }
    }

    /// Text and CDATA children of `id` joined together. Text inside child
    /// elements does not count.
    ///
    /// `None` when `id` has no text-bearing child at all.
    #[must_use]
    pub fn direct_text(&self, id: NodeId) -> Option<String> {
        self.children(id)
            .filter_map(|c| self.text_of(c))
            .fold(None, |acc: Option<String>, t| {
                let mut acc = acc.unwrap_or_default();
                acc.push_str(t);
                Some(acc)
            })
    }

    /// All text and CDATA at or below `id`, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|n| self.text_of(n))
            .collect()
    }

    /// Attribute value by name. Non-elements have no attributes.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let NodeKind::Element { attributes, .. } = &self.node(id).kind else {
            return None;
        };
        attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets or replaces an attribute. Does nothing on non-elements.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind else {
            return;
        };
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => value.clone_into(&mut attr.value),
            None => attributes.push(Attribute::new(name, value)),
        }
    }

    // --- Navigation ---

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Children of `id`, first to last.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_child(id), |&c| self.next_sibling(c))
    }

    /// Element children of `id`, skipping text, comments and PIs.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|&c| self.is_element(c))
    }

    /// Everything below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            top: id,
            next: self.first_child(id),
        }
    }

    /// Elements named `tag` anywhere below `id`, in document order.
    #[must_use]
    pub fn elements_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&d| self.node_name(d) == Some(tag))
            .collect()
    }

    /// The last element child of `parent` named `tag`.
    #[must_use]
    pub fn last_child_by_tag(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        std::iter::successors(self.last_child(parent), |&c| self.prev_sibling(c))
            .find(|&c| self.node_name(c) == Some(tag))
    }

    // --- Mutation ---

    /// Allocates a detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(kind.into());
        NodeId::from_index(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_node(NodeKind::element(name))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.create_node(NodeKind::text(content))
    }

    /// Links detached `child` between `prev` and `next` under `parent`.
    fn link(&mut self, parent: NodeId, child: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "node is still attached; detach it first"
        );
        let slot = self.node_mut(child);
        slot.parent = Some(parent);
        slot.prev_sibling = prev;
        slot.next_sibling = next;
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = Some(child),
            None => self.node_mut(parent).last_child = Some(child),
        }
    }

    /// Makes detached `child` the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let last = self.last_child(parent);
        self.link(parent, child, last, None);
    }

    /// Places detached `node` right after `reference`.
    ///
    /// Returns `false`, changing nothing, if `reference` has no parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let next = self.next_sibling(reference);
        self.link(parent, node, Some(reference), next);
        true
    }

    /// Unlinks `id` from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let NodeData {
            parent: Some(parent),
            prev_sibling: prev,
            next_sibling: next,
            ..
        } = *self.node(id)
        else {
            return;
        };
        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let slot = self.node_mut(id);
        slot.parent = None;
        slot.prev_sibling = None;
        slot.next_sibling = None;
    }

    /// Detaches every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    /// Deep-copies `src_node` and its subtree from `src` into this
    /// document. The copy comes back detached.
    pub fn import_subtree(&mut self, src: &Document, src_node: NodeId) -> NodeId {
        let top = self.create_node(src.node(src_node).kind.clone());
        let mut pending = vec![(src_node, top)];
        while let Some((from, to)) = pending.pop() {
            for child in src.children(from) {
                let copy = self.create_node(src.node(child).kind.clone());
                self.append_child(to, copy);
                pending.push((child, copy));
            }
        }
        top
    }

    /// Copies the subtree at `id` into a new document, as its top-level
    /// node. The declaration's version and encoding carry over.
    #[must_use]
    pub fn extract(&self, id: NodeId) -> Document {
        let mut doc = Document::new();
        doc.version.clone_from(&self.version);
        doc.encoding.clone_from(&self.encoding);
        let copy = doc.import_subtree(self, id);
        doc.append_child(doc.root, copy);
        doc
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Preorder walk below a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    top: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.first_child(current).or_else(|| {
            let mut n = current;
            loop {
                if n == self.top {
                    return None;
                }
                if let Some(sibling) = self.doc.next_sibling(n) {
                    return Some(sibling);
                }
                n = self.doc.parent(n)?;
            }
        });
        Some(current)
    }
}
