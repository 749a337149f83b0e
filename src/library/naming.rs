//! Names that address an element through a path.

use crate::tree::{Document, NodeId};

/// The `id` attribute of `node`. An empty `id` counts as none.
fn identifier(doc: &Document, node: NodeId) -> Option<&str> {
    doc.attribute(node, "id").filter(|id| !id.is_empty())
}

/// Position of `node` among the elements with its tag below its parent.
fn tag_index(doc: &Document, node: NodeId, tag: &str) -> usize {
    doc.parent(node)
        .and_then(|parent| {
            doc.elements_by_tag(parent, tag)
                .iter()
                .position(|&n| n == node)
        })
        .unwrap_or(0)
}

fn indexed_tag(doc: &Document, node: NodeId, tag: &str) -> String {
    match tag_index(doc, node, tag) {
        0 => tag.to_string(),
        n => format!("{tag}{n}"),
    }
}

/// The path component that resolves to `node` from its parent:
/// `tag(id)` when the element has an `id`, otherwise `tag` or `tagN`.
///
/// Non-element nodes have no component name.
#[must_use]
pub fn component_name(doc: &Document, node: NodeId) -> Option<String> {
    let tag = doc.node_name(node)?;
    Some(match identifier(doc, node) {
        Some(id) => format!("{tag}({id})"),
        None => indexed_tag(doc, node, tag),
    })
}

/// The `id` attribute of `node`, or `tag` / `tagN` when it has none.
#[must_use]
pub fn node_id(doc: &Document, node: NodeId) -> Option<String> {
    let tag = doc.node_name(node)?;
    Some(match identifier(doc, node) {
        Some(id) => id.to_string(),
        None => indexed_tag(doc, node, tag),
    })
}

/// Dotted component names from below the document's root element down to
/// `node`. The root element itself has the empty path.
#[must_use]
pub fn node_path(doc: &Document, node: NodeId) -> Option<String> {
    doc.node_name(node)?;
    let mut names = Vec::new();
    let mut current = node;
    while let Some(parent) = doc.parent(current).filter(|&p| doc.is_element(p)) {
        names.push(component_name(doc, current)?);
        current = parent;
    }
    names.reverse();
    Some(names.join("."))
}

/// Dotted component names from `base` (exclusive) down to `node`, or
/// `None` if `base` is not an ancestor of `node`.
#[must_use]
pub fn relative_path(doc: &Document, base: NodeId, node: NodeId) -> Option<String> {
    let mut names = Vec::new();
    let mut current = node;
    while current != base {
        names.push(component_name(doc, current)?);
        current = doc.parent(current)?;
    }
    names.reverse();
    Some(names.join("."))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::path::{parse_path, resolve};
    use pretty_assertions::assert_eq;

    const DOC: &str = "<run><input>\
        <string id=\"test\"><current>x</current></string>\
        <group><number/></group>\
        <number/><number/>\
        </input></run>";

    fn setup() -> (Document, NodeId) {
        let doc = Document::parse_str(DOC).unwrap();
        let run = doc.root_element().unwrap();
        (doc, run)
    }

    fn at(doc: &Document, run: NodeId, path: &str) -> NodeId {
        resolve(doc, run, &parse_path(path).unwrap()).unwrap()
    }

    #[test]
    fn test_component_names() {
        let (doc, run) = setup();
        assert_eq!(
            component_name(&doc, at(&doc, run, "input.string(test)")).as_deref(),
            Some("string(test)")
        );
        // Indices count same-tag elements in the parent's whole subtree.
        assert_eq!(component_name(&doc, at(&doc, run, "input.number")).as_deref(), Some("number"));
        assert_eq!(component_name(&doc, at(&doc, run, "input.number1")).as_deref(), Some("number1"));
        assert_eq!(component_name(&doc, at(&doc, run, "input.number2")).as_deref(), Some("number2"));
    }

    #[test]
    fn test_node_id_prefers_attribute() {
        let (doc, run) = setup();
        assert_eq!(node_id(&doc, at(&doc, run, "input.string(test)")).as_deref(), Some("test"));
        assert_eq!(node_id(&doc, at(&doc, run, "input.number2")).as_deref(), Some("number2"));
    }

    #[test]
    fn test_empty_id_counts_as_none() {
        let doc = Document::parse_str("<run><a id=\"\"/><a/></run>").unwrap();
        let run = doc.root_element().unwrap();
        let first = doc.first_child(run).unwrap();
        let name = component_name(&doc, first).unwrap();
        assert_eq!(name, "a");
        assert_eq!(node_id(&doc, first).as_deref(), Some("a"));
        assert_eq!(resolve(&doc, run, &parse_path(&name).unwrap()), Some(first));
    }

    #[test]
    fn test_node_path() {
        let (doc, run) = setup();
        let current = at(&doc, run, "input.string(test).current");
        assert_eq!(
            node_path(&doc, current).as_deref(),
            Some("input.string(test).current")
        );
        assert_eq!(node_path(&doc, run).as_deref(), Some(""));
    }

    #[test]
    fn test_names_resolve_back() {
        let (doc, run) = setup();
        for node in doc.descendants(run).filter(|&n| doc.is_element(n)) {
            let path = node_path(&doc, node).unwrap();
            assert_eq!(resolve(&doc, run, &parse_path(&path).unwrap()), Some(node), "{path}");
        }
    }

    #[test]
    fn test_relative_path() {
        let (doc, run) = setup();
        let input = at(&doc, run, "input");
        let inner = at(&doc, run, "input.group.number");
        assert_eq!(relative_path(&doc, input, inner).as_deref(), Some("group.number"));
        assert_eq!(relative_path(&doc, inner, input), None);
    }

    #[test]
    fn test_text_nodes_have_no_name() {
        let (doc, run) = setup();
        let current = at(&doc, run, "input.string(test).current");
        let text = doc.first_child(current).unwrap();
        assert_eq!(component_name(&doc, text), None);
        assert_eq!(node_path(&doc, text), None);
    }
}
