//! Markup serializer.
//!
//! Serializes a `Document`, or any subtree of one, back to text.

use std::fmt::Write;

use crate::tree::{Document, NodeId, NodeKind};

/// Options controlling serialization output.
///
/// # Examples
///
/// ```
/// use rplib::Document;
/// use rplib::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<run><input>1</input></run>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
/// assert!(xml.contains("\n    <input>1</input>\n"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to four spaces.
    pub indent_str: String,
    /// Whether a whole-document serialization starts with the XML
    /// declaration. Defaults to `true`.
    pub declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "    ".to_string(),
            declaration: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented output.
    ///
    /// Only element-only content is indented; an element holding text keeps
    /// its children exactly as they are.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables the leading XML declaration.
    #[must_use]
    pub fn declaration(mut self, yes: bool) -> Self {
        self.declaration = yes;
        self
    }
}

/// Serializes a document with default (compact) options.
///
/// ```
/// use rplib::Document;
/// use rplib::serial::serialize;
///
/// let doc = Document::parse_str("<run><a>x &amp; y</a></run>").unwrap();
/// assert_eq!(serialize(&doc), "<?xml version=\"1.0\"?>\n<run><a>x &amp; y</a></run>\n");
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document with the given options.
///
/// Every top-level node ends with a newline.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut w = Writer::new(doc, options);
    if options.declaration {
        w.declaration();
    }
    for child in doc.children(doc.root()) {
        w.node(child, 0, false);
        w.out.push('\n');
    }
    w.out
}

/// Serializes one node and its subtree, without an XML declaration.
///
/// The document node serializes as its children.
#[must_use]
pub fn serialize_subtree(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut w = Writer::new(doc, options);
    w.node(id, 0, options.indent);
    if options.indent && w.out.ends_with('\n') {
        w.out.pop();
    }
    w.out
}

struct Writer<'a> {
    doc: &'a Document,
    options: &'a SerializeOptions,
    out: String,
}

impl<'a> Writer<'a> {
    fn new(doc: &'a Document, options: &'a SerializeOptions) -> Self {
        Self {
            doc,
            options,
            out: String::new(),
        }
    }

    fn declaration(&mut self) {
        let doc = self.doc;
        let _ = write!(
            self.out,
            "<?xml version=\"{}\"",
            doc.version.as_deref().unwrap_or("1.0")
        );
        if let Some(encoding) = &doc.encoding {
            let _ = write!(self.out, " encoding=\"{encoding}\"");
        }
        if let Some(standalone) = doc.standalone {
            let yes_no = if standalone { "yes" } else { "no" };
            let _ = write!(self.out, " standalone=\"{yes_no}\"");
        }
        self.out.push_str("?>\n");
    }

    /// Writes `id` at `depth`. A `line` node sits on its own indented line.
    fn node(&mut self, id: NodeId, depth: usize, line: bool) {
        let doc = self.doc;
        let line = line && self.options.indent;
        match &doc.node(id).kind {
            NodeKind::Document => {
                for child in doc.children(id) {
                    self.node(child, depth, line);
                }
                return;
            }
            NodeKind::Text { content } => {
                escape_into(&mut self.out, content, false);
                return;
            }
            NodeKind::CData { content } => {
                let _ = write!(self.out, "<![CDATA[{content}]]>");
                return;
            }
            _ => {}
        }

        if line {
            self.indent(depth);
        }
        match &doc.node(id).kind {
            NodeKind::Element { name, attributes } => {
                self.out.push('<');
                self.out.push_str(name);
                for attr in attributes {
                    let _ = write!(self.out, " {}=\"", attr.name);
                    escape_into(&mut self.out, &attr.value, true);
                    self.out.push('"');
                }
                if doc.first_child(id).is_none() {
                    self.out.push_str("/>");
                } else {
                    self.out.push('>');
                    self.content(id, depth);
                    let _ = write!(self.out, "</{name}>");
                }
            }
            NodeKind::Comment { content } => {
                let _ = write!(self.out, "<!--{content}-->");
            }
            NodeKind::ProcessingInstruction { target, data } => {
                let _ = match data {
                    Some(data) => write!(self.out, "<?{target} {data}?>"),
                    None => write!(self.out, "<?{target}?>"),
                };
            }
            NodeKind::Document | NodeKind::Text { .. } | NodeKind::CData { .. } => {}
        }
        if line {
            self.out.push('\n');
        }
    }

    /// The children of element `id`, one per line when they are all
    /// markup.
    fn content(&mut self, id: NodeId, depth: usize) {
        let doc = self.doc;
        let block = self.options.indent && holds_only_markup(doc, id);
        if block {
            self.out.push('\n');
        }
        for child in doc.children(id) {
            if block && is_blank_text(doc, child) {
                continue;
            }
            self.node(child, depth + 1, block);
        }
        if block {
            self.indent(depth);
        }
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent_str);
        }
    }
}

fn is_blank_text(doc: &Document, id: NodeId) -> bool {
    matches!(&doc.node(id).kind, NodeKind::Text { content } if content.trim().is_empty())
}

/// `true` when `id` has element children and no text beyond whitespace.
fn holds_only_markup(doc: &Document, id: NodeId) -> bool {
    let mut elements = false;
    for child in doc.children(id) {
        match &doc.node(child).kind {
            NodeKind::Element { .. } => elements = true,
            NodeKind::CData { .. } => return false,
            NodeKind::Text { .. } if !is_blank_text(doc, child) => return false,
            _ => {}
        }
    }
    elements
}

/// Appends `text` with markup characters escaped.
///
/// Control characters and `\r` become character references so a parser
/// reads them back unchanged. In attribute values tab and newline do too,
/// since attribute normalization would turn them into spaces.
fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\t' if attribute => out.push_str("&#9;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(c),
            c if c < ' ' => {
                let _ = write!(out, "&#x{:X};", u32::from(c));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(input: &str) -> String {
        let doc = Document::parse_str(input).unwrap();
        serialize(&doc)
    }

    #[test]
    fn test_compact_document() {
        assert_eq!(
            roundtrip("<run><input><string id=\"t\"/></input></run>"),
            "<?xml version=\"1.0\"?>\n<run><input><string id=\"t\"/></input></run>\n"
        );
    }

    #[test]
    fn test_declaration_fields_kept() {
        let out = roundtrip("<?xml version=\"1.0\" encoding=\"UTF-8\"?><run/>");
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(
            roundtrip("<a>&lt;x&gt; &amp; \"q\"</a>"),
            "<?xml version=\"1.0\"?>\n<a>&lt;x&gt; &amp; \"q\"</a>\n"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let mut doc = Document::with_root_element("a");
        let a = doc.root_element().unwrap();
        doc.set_attribute(a, "v", "1<2 & \"x\"\n");
        let out = serialize_subtree(&doc, a, &SerializeOptions::default());
        assert_eq!(out, "<a v=\"1&lt;2 &amp; &quot;x&quot;&#10;\"/>");

        let reparsed = Document::parse_str(&out).unwrap();
        let root = reparsed.root_element().unwrap();
        assert_eq!(reparsed.attribute(root, "v"), Some("1<2 & \"x\"\n"));
    }

    #[test]
    fn test_indented_element_only_content() {
        let doc = Document::parse_str("<run><input><x>1</x></input><output/></run>").unwrap();
        let out = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
        assert_eq!(
            out,
            "<?xml version=\"1.0\"?>\n<run>\n    <input>\n        <x>1</x>\n    </input>\n    <output/>\n</run>\n"
        );
    }

    #[test]
    fn test_indent_leaves_mixed_content_alone() {
        let doc = Document::parse_str("<a>text<b/>more</a>").unwrap();
        let out = serialize_with_options(
            &doc,
            &SerializeOptions::default().indent(true).declaration(false),
        );
        assert_eq!(out, "<a>text<b/>more</a>\n");
    }

    #[test]
    fn test_custom_indent_str() {
        let doc = Document::parse_str("<a><b/></a>").unwrap();
        let opts = SerializeOptions::default()
            .indent(true)
            .indent_str("\t")
            .declaration(false);
        assert_eq!(serialize_with_options(&doc, &opts), "<a>\n\t<b/>\n</a>\n");
    }

    #[test]
    fn test_subtree_compact() {
        let doc = Document::parse_str("<run><input><x>1</x></input></run>").unwrap();
        let run = doc.root_element().unwrap();
        let input = doc.first_child(run).unwrap();
        assert_eq!(
            serialize_subtree(&doc, input, &SerializeOptions::default()),
            "<input><x>1</x></input>"
        );
    }

    #[test]
    fn test_subtree_indented_has_no_trailing_newline() {
        let doc = Document::parse_str("<run><input><x>1</x></input></run>").unwrap();
        let run = doc.root_element().unwrap();
        let out = serialize_subtree(&doc, run, &SerializeOptions::default().indent(true));
        assert_eq!(out, "<run>\n    <input>\n        <x>1</x>\n    </input>\n</run>");
    }

    #[test]
    fn test_roundtrip_preserves_tree() {
        let input = "<run><a id=\"x\">one<!--c--><![CDATA[<two>]]><?pi data?></a>\r\n</run>";
        let doc = Document::parse_str(input).unwrap();
        let first = serialize(&doc);
        let again = serialize(&Document::parse_str(&first).unwrap());
        assert_eq!(first, again);
    }

    #[test]
    fn test_carriage_return_in_text_survives() {
        let mut doc = Document::with_root_element("a");
        let a = doc.root_element().unwrap();
        let t = doc.create_text("x\ry");
        doc.append_child(a, t);
        let out = serialize(&doc);
        let reparsed = Document::parse_str(&out).unwrap();
        let root = reparsed.root_element().unwrap();
        assert_eq!(reparsed.direct_text(root).as_deref(), Some("x\ry"));
    }
}
