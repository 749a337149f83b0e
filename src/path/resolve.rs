//! Walking a [`Path`] through a [`Document`].
//!
//! Each step starts at the current node:
//!
//! - `tag` / `tagN`: the N-th element named `tag` anywhere below the
//!   current node, in document order.
//! - `tag(id)`: the first element named `tag` below the current node whose
//!   `id` attribute is `id`. Any index is ignored.
//! - `(id)`: the first direct element child whose `id` is `id`.
//! - `tag#...`: never matches.
//!
//! On a miss, [`resolve_or_create`] appends a new `<tag>` to the current
//! node (right after its last `<tag>` child for `tag#`) and sets `id` if
//! the component has one.

use crate::tree::{Document, NodeId};

use super::{Path, PathComponent, PathError};

/// Resolves `path` starting at `from` without modifying the document.
///
/// Returns `None` as soon as a component does not match.
#[must_use]
pub fn resolve(doc: &Document, from: NodeId, path: &Path) -> Option<NodeId> {
    path.into_iter()
        .try_fold(from, |current, component| find_step(doc, current, component))
}

/// Resolves `path` starting at `from`, creating every missing element.
///
/// # Errors
///
/// Returns [`PathError::CannotCreate`] when a component without a tag
/// misses. Elements created by earlier components stay in the document.
pub fn resolve_or_create(doc: &mut Document, from: NodeId, path: &Path) -> Result<NodeId, PathError> {
    let mut current = from;
    for component in path {
        current = match find_step(doc, current, component) {
            Some(found) => found,
            None => create_step(doc, current, component)?,
        };
    }
    Ok(current)
}

fn find_step(doc: &Document, current: NodeId, component: &PathComponent) -> Option<NodeId> {
    if component.auto_number {
        return None;
    }
    match (&component.tag, &component.identifier) {
        (Some(tag), None) => {
            let index = component.index.unwrap_or(0) as usize;
            doc.descendants(current)
                .filter(|&d| doc.node_name(d) == Some(tag.as_str()))
                .nth(index)
        }
        (Some(tag), Some(id)) => doc.descendants(current).find(|&d| {
            doc.node_name(d) == Some(tag.as_str()) && doc.attribute(d, "id") == Some(id.as_str())
        }),
        (None, Some(id)) => doc
            .element_children(current)
            .find(|&c| doc.attribute(c, "id") == Some(id.as_str())),
        (None, None) => None,
    }
}

fn create_step(
    doc: &mut Document,
    current: NodeId,
    component: &PathComponent,
) -> Result<NodeId, PathError> {
    let Some(tag) = component.tag.as_deref() else {
        return Err(PathError::CannotCreate {
            component: component.to_string(),
        });
    };

    let node = doc.create_element(tag);
    let placed_after = if component.auto_number {
        doc.last_child_by_tag(current, tag)
    } else {
        None
    };
    match placed_after {
        Some(sibling) => {
            doc.insert_after(sibling, node);
        }
        None => doc.append_child(current, node),
    }
    if let Some(id) = &component.identifier {
        doc.set_attribute(node, "id", id);
    }

    log::debug!("created <{tag}> for path component '{component}'");
    Ok(node)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::path::parse_path;
    use crate::serial::{serialize_subtree, SerializeOptions};
    use pretty_assertions::assert_eq;

    const RUN: &str = "<run><input>\
        <string id=\"t\"><current>abc</current></string>\
        <group><number id=\"n\"><current>1</current></number></group>\
        <number><current>2</current></number>\
        </input></run>";

    fn doc() -> (Document, NodeId) {
        let doc = Document::parse_str(RUN).unwrap();
        let run = doc.root_element().unwrap();
        (doc, run)
    }

    fn find(doc: &Document, from: NodeId, path: &str) -> Option<NodeId> {
        resolve(doc, from, &parse_path(path).unwrap())
    }

    fn text(doc: &Document, id: Option<NodeId>) -> Option<String> {
        id.map(|n| doc.text_content(n))
    }

    fn compact(doc: &Document, id: NodeId) -> String {
        serialize_subtree(doc, id, &SerializeOptions::default())
    }

    #[test]
    fn test_empty_path_is_start_node() {
        let (doc, run) = doc();
        assert_eq!(find(&doc, run, ""), Some(run));
    }

    #[test]
    fn test_identifier_lookups() {
        let (doc, run) = doc();
        assert_eq!(text(&doc, find(&doc, run, "input.(t).current")).as_deref(), Some("abc"));
        assert_eq!(
            text(&doc, find(&doc, run, "input.string(t).current")).as_deref(),
            Some("abc")
        );
        assert_eq!(find(&doc, run, "input.(missing).current"), None);
    }

    #[test]
    fn test_positional_lookup_defaults_to_first() {
        let (doc, run) = doc();
        assert_eq!(
            find(&doc, run, "input.string.current"),
            find(&doc, run, "input.string0.current")
        );
        assert_eq!(text(&doc, find(&doc, run, "input.string.current")).as_deref(), Some("abc"));
    }

    #[test]
    fn test_tag_scan_reaches_nested_elements() {
        let (doc, run) = doc();
        // number0 sits inside <group>, number1 is a direct child of <input>.
        assert_eq!(text(&doc, find(&doc, run, "input.number.current")).as_deref(), Some("1"));
        assert_eq!(text(&doc, find(&doc, run, "input.number1.current")).as_deref(), Some("2"));
        assert_eq!(find(&doc, run, "input.number2"), None);
        assert_eq!(text(&doc, find(&doc, run, "input.number(n)")).as_deref(), Some("1"));
    }

    #[test]
    fn test_bare_identifier_only_checks_direct_children() {
        let (doc, run) = doc();
        assert_eq!(find(&doc, run, "input.(n)"), None);
        assert!(find(&doc, run, "input.group.(n)").is_some());
    }

    #[test]
    fn test_auto_number_never_matches() {
        let (doc, run) = doc();
        assert_eq!(find(&doc, run, "input#"), None);
    }

    #[test]
    fn test_create_intermediate_nodes() {
        let (mut doc, run) = doc();
        let path = parse_path("output.curve(f12).component.xy").unwrap();
        let xy = resolve_or_create(&mut doc, run, &path).unwrap();
        assert_eq!(doc.node_name(xy), Some("xy"));
        let output = find(&doc, run, "output").unwrap();
        assert_eq!(
            compact(&doc, output),
            "<output><curve id=\"f12\"><component><xy/></component></curve></output>"
        );
        // Resolving again finds the same node.
        assert_eq!(resolve_or_create(&mut doc, run, &path).unwrap(), xy);
    }

    #[test]
    fn test_create_appends_as_last_child() {
        let (mut doc, run) = doc();
        let input = find(&doc, run, "input").unwrap();
        let path = parse_path("boolean(b)").unwrap();
        let created = resolve_or_create(&mut doc, input, &path).unwrap();
        assert_eq!(doc.last_child(input), Some(created));
        assert_eq!(doc.attribute(created, "id"), Some("b"));
    }

    #[test]
    fn test_auto_number_inserts_after_last_same_tag_child() {
        let mut doc = Document::parse_str("<run><bar/><baz/></run>").unwrap();
        let run = doc.root_element().unwrap();
        let path = parse_path("bar#").unwrap();
        let first = resolve_or_create(&mut doc, run, &path).unwrap();
        let second = resolve_or_create(&mut doc, run, &path).unwrap();
        assert_ne!(first, second);
        assert_eq!(compact(&doc, run), "<run><bar/><bar/><bar/><baz/></run>");
        assert_eq!(doc.next_sibling(first), Some(second));
    }

    #[test]
    fn test_auto_number_appends_without_same_tag_child() {
        let mut doc = Document::parse_str("<run><baz/></run>").unwrap();
        let run = doc.root_element().unwrap();
        resolve_or_create(&mut doc, run, &parse_path("bar#(x)").unwrap()).unwrap();
        assert_eq!(compact(&doc, run), "<run><baz/><bar id=\"x\"/></run>");
    }

    #[test]
    fn test_index_miss_creates_single_node() {
        let (mut doc, run) = doc();
        let created = resolve_or_create(&mut doc, run, &parse_path("output.log3").unwrap()).unwrap();
        assert_eq!(doc.node_name(created), Some("log"));
        assert_eq!(doc.elements_by_tag(run, "log").len(), 1);
    }

    #[test]
    fn test_anonymous_identifier_cannot_be_created() {
        let (mut doc, run) = doc();
        let path = parse_path("tool.(missing)").unwrap();
        let err = resolve_or_create(&mut doc, run, &path).unwrap_err();
        assert_eq!(
            err,
            PathError::CannotCreate {
                component: "(missing)".to_string()
            }
        );
        // Not transactional: <tool> was created before the failure.
        assert!(find(&doc, run, "tool").is_some());
    }
}
