//! Path-addressed access to a run document.
//!
//! A [`Library`] owns a [`Document`] and a focus element. Every path is
//! resolved relative to the focus: reads never change the document, writes
//! create whatever elements the path names but the document lacks.
//!
//! ```
//! use rplib::Library;
//!
//! let mut lib = Library::parse_str(
//!     r#"<run><input><string id="t"><current>abc</current></string></input></run>"#,
//! ).unwrap();
//! assert_eq!(lib.get("input.(t).current").unwrap().as_deref(), Some("abc"));
//!
//! lib.put_text("output.curve(f12).component.xy", "1 2\n3 4", false).unwrap();
//! assert_eq!(
//!     lib.get("output.curve(f12).component.xy").unwrap().as_deref(),
//!     Some("1 2\n3 4"),
//! );
//! ```

mod entity;
mod error;
mod flavor;
pub mod naming;

pub use entity::{Difference, EntityValue};
pub use error::LibraryError;
pub use flavor::{Flavored, ResultFlavor};

use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::encoding::{self, Scheme};
use crate::parser::input::is_xml_char;
use crate::parser::{self, ParseOptions};
use crate::path::{parse_path, resolve, resolve_or_create, PathError};
use crate::serial::{serialize, serialize_subtree, serialize_with_options, SerializeOptions};
use crate::tree::{Document, NodeId, NodeKind};

/// Prefix of the line a tool prints to report the run file it wrote.
pub const RUN_MARKER: &str = "=RAPPTURE-RUN=>";

/// A value stored by [`Library::put`].
#[derive(Debug, Clone, Copy)]
pub enum PutValue<'a> {
    /// Text content. Empty text adds nothing.
    Text(&'a str),
    /// A deep copy of another library's focus element.
    Tree(&'a Library),
    /// A deep copy of a node of any document.
    Node(&'a Document, NodeId),
    /// A deep copy of a node of the library being written.
    Local(NodeId),
}

impl<'a> From<&'a str> for PutValue<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for PutValue<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a Library> for PutValue<'a> {
    fn from(lib: &'a Library) -> Self {
        Self::Tree(lib)
    }
}

/// A document together with the element paths are resolved from.
#[derive(Debug, Clone)]
pub struct Library {
    doc: Document,
    focus: NodeId,
}

impl Library {
    /// Creates a library holding only an empty `<root_tag>` element.
    #[must_use]
    pub fn new(root_tag: &str) -> Self {
        Self::from_document(Document::with_root_element(root_tag))
    }

    /// Opens `source`: text beginning with `<?xml` (in any case) is parsed
    /// directly, anything else is taken as the name of a file to read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the text is not
    /// well-formed.
    pub fn open(source: &str) -> Result<Self, LibraryError> {
        Self::open_with_options(source, &ParseOptions::default())
    }

    /// Like [`open`](Self::open), with explicit parser options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the text is not
    /// well-formed.
    pub fn open_with_options(source: &str, options: &ParseOptions) -> Result<Self, LibraryError> {
        let inline = source
            .as_bytes()
            .get(..5)
            .is_some_and(|head| head.eq_ignore_ascii_case(b"<?xml"));
        if inline {
            Self::parse_with_options(source, options)
        } else {
            Self::from_file_with_options(source, options)
        }
    }

    /// Parses document text.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Parse`] if the text is not well-formed.
    pub fn parse_str(text: &str) -> Result<Self, LibraryError> {
        Ok(Self::from_document(parser::parse_str(text)?))
    }

    /// Parses document text with explicit parser options.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Parse`] if the text is not well-formed.
    pub fn parse_with_options(text: &str, options: &ParseOptions) -> Result<Self, LibraryError> {
        Ok(Self::from_document(parser::parse_str_with_options(
            text, options,
        )?))
    }

    /// Reads and parses a file, detecting its character encoding.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be read and
    /// [`LibraryError::Parse`] if it is not well-formed.
    pub fn from_file(path: impl AsRef<FsPath>) -> Result<Self, LibraryError> {
        Self::from_file_with_options(path, &ParseOptions::default())
    }

    /// Like [`from_file`](Self::from_file), with explicit parser options.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be read and
    /// [`LibraryError::Parse`] if it is not well-formed.
    pub fn from_file_with_options(
        path: impl AsRef<FsPath>,
        options: &ParseOptions,
    ) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| LibraryError::io(path, e))?;
        log::debug!("loaded {} bytes from {}", bytes.len(), path.display());
        Ok(Self::from_document(parser::parse_bytes_with_options(
            &bytes, options,
        )?))
    }

    /// Wraps a document, focused on its root element.
    #[must_use]
    pub fn from_document(doc: Document) -> Self {
        let focus = doc.root_element().unwrap_or_else(|| doc.root());
        Self { doc, focus }
    }

    /// Wraps a document, focused on `node`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Argument`] if `node` is not an element of
    /// `doc`.
    pub fn from_node(doc: Document, node: NodeId) -> Result<Self, LibraryError> {
        if !doc.contains(node) || !doc.is_element(node) {
            return Err(LibraryError::argument("focus node is not an element of the document"));
        }
        Ok(Self { doc, focus: node })
    }

    /// The underlying document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the underlying document.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The element every path starts from.
    #[must_use]
    pub fn focus(&self) -> NodeId {
        self.focus
    }

    /// Consumes the library, returning its document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.doc
    }

    // --- Reading ---

    fn find(&self, path: &str) -> Result<Option<NodeId>, PathError> {
        self.find_from(self.focus, path)
    }

    fn find_from(&self, from: NodeId, path: &str) -> Result<Option<NodeId>, PathError> {
        Ok(resolve(&self.doc, from, &parse_path(path)?))
    }

    fn text_of(&self, node: NodeId) -> String {
        self.doc.direct_text(node).unwrap_or_default()
    }

    fn text_from(&self, from: NodeId, path: &str) -> Result<Option<String>, PathError> {
        Ok(self.find_from(from, path)?.map(|n| self.text_of(n)))
    }

    /// Returns the text directly inside the element at `path`, exactly as
    /// stored. Text nested in child elements is not included.
    ///
    /// Returns `None` if the path does not resolve and `Some("")` for an
    /// element without text.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn get(&self, path: &str) -> Result<Option<String>, PathError> {
        self.text_from(self.focus, path)
    }

    /// Like [`get`](Self::get), with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn get_trimmed(&self, path: &str) -> Result<Option<String>, PathError> {
        Ok(self.get(path)?.map(|text| text.trim().to_string()))
    }

    /// Reads the value at `path` as a number.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Argument`] if the text is not a number.
    pub fn get_f64(&self, path: &str) -> Result<Option<f64>, LibraryError> {
        let Some(text) = self.get_trimmed(path)? else {
            return Ok(None);
        };
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| LibraryError::argument(format!("value '{text}' at '{path}' is not a number")))
    }

    /// Reads the value at `path`, decoding it if it carries an encoding
    /// header.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Encoding`] if an encoded payload is corrupt.
    pub fn get_decoded(&self, path: &str) -> Result<Option<Vec<u8>>, LibraryError> {
        let Some(text) = self.get(path)? else {
            return Ok(None);
        };
        if !encoding::is_encoded(text.as_bytes()) {
            return Ok(Some(text.into_bytes()));
        }
        match encoding::decode(text.as_bytes()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                log::warn!("cannot decode value at '{path}': {e}");
                Err(e.into())
            }
        }
    }

    /// Returns the element at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn element(&self, path: &str) -> Result<Option<NodeId>, PathError> {
        self.find(path)
    }

    /// Returns the element at `path` in the given flavor.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn element_as(&self, path: &str, flavor: ResultFlavor) -> Result<Option<Flavored>, PathError> {
        Ok(self.find(path)?.and_then(|n| flavor.apply(&self.doc, n)))
    }

    /// Returns the element children of the element at `path`, in document
    /// order, optionally only those tagged `restrict`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn children(&self, path: &str, restrict: Option<&str>) -> Result<Option<Vec<NodeId>>, PathError> {
        Ok(self.find(path)?.map(|node| {
            self.doc
                .element_children(node)
                .filter(|&c| restrict.map_or(true, |tag| self.doc.node_name(c) == Some(tag)))
                .collect()
        }))
    }

    /// Like [`children`](Self::children), in the given flavor.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn children_as(
        &self,
        path: &str,
        flavor: ResultFlavor,
        restrict: Option<&str>,
    ) -> Result<Option<Vec<Flavored>>, PathError> {
        Ok(self.children(path, restrict)?.map(|nodes| {
            nodes
                .into_iter()
                .filter_map(|n| flavor.apply(&self.doc, n))
                .collect()
        }))
    }

    /// Returns the parent element of the element at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn parent(&self, path: &str) -> Result<Option<NodeId>, PathError> {
        Ok(self
            .find(path)?
            .and_then(|n| self.doc.parent(n))
            .filter(|&p| self.doc.is_element(p)))
    }

    /// The component name of `node`: `tag(id)`, `tag` or `tagN`.
    #[must_use]
    pub fn component_name(&self, node: NodeId) -> Option<String> {
        self.owned(node)
            .and_then(|node| naming::component_name(&self.doc, node))
    }

    /// The `id` of `node`, or its `tag` / `tagN` name.
    #[must_use]
    pub fn node_id(&self, node: NodeId) -> Option<String> {
        self.owned(node).and_then(|node| naming::node_id(&self.doc, node))
    }

    /// The tag of `node`.
    #[must_use]
    pub fn node_type(&self, node: NodeId) -> Option<&str> {
        self.owned(node).and_then(|node| self.doc.node_name(node))
    }

    /// The dotted path of `node` from the document's root element.
    #[must_use]
    pub fn node_path(&self, node: NodeId) -> Option<String> {
        self.owned(node).and_then(|node| naming::node_path(&self.doc, node))
    }

    /// `node`, if it indexes this library's document.
    fn owned(&self, node: NodeId) -> Option<NodeId> {
        Some(node).filter(|&n| self.doc.contains(n))
    }

    // --- Writing ---

    /// Stores `value` at `path`, creating missing elements.
    ///
    /// Without `append` the target's children are replaced. With it only
    /// its text and CDATA children stay, and the value goes after them.
    /// When `id` is given it becomes the target's `id` attribute. Returns
    /// the target element.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed or names an element that
    /// cannot be created, if a node value does not belong to its
    /// document, or if text or `id` hold characters XML cannot represent. Elements created before a failure stay in the document.
    pub fn put<'a>(
        &mut self,
        path: &str,
        value: impl Into<PutValue<'a>>,
        id: Option<&str>,
        append: bool,
    ) -> Result<NodeId, LibraryError> {
        let value = value.into();
        let parsed = parse_path(path)?;
        if let PutValue::Text(text) = value {
            check_text(text, "value")?;
        }
        if let Some(id) = id {
            check_text(id, "id")?;
        }

        // The source may sit below the target, so copy it out first.
        let snapshot = match value {
            PutValue::Local(node) => {
                if !self.doc.contains(node) {
                    return Err(LibraryError::argument("node is not part of this document"));
                }
                Some(self.doc.extract(node))
            }
            PutValue::Node(doc, node) if !doc.contains(node) => {
                return Err(LibraryError::argument("node is not part of its document"));
            }
            _ => None,
        };

        let target = resolve_or_create(&mut self.doc, self.focus, &parsed)?;
        if append {
            self.clear_markup(target);
        } else {
            self.doc.clear_children(target);
        }

        match (value, &snapshot) {
            (PutValue::Text(text), _) => {
                if !text.is_empty() {
                    let node = self.doc.create_text(text);
                    self.doc.append_child(target, node);
                }
            }
            (PutValue::Tree(lib), _) => self.graft(target, &lib.doc, lib.focus),
            (PutValue::Node(doc, node), _) => self.graft(target, doc, node),
            (PutValue::Local(_), Some(copy)) => {
                if let Some(top) = copy.first_child(copy.root()) {
                    self.graft(target, copy, top);
                }
            }
            (PutValue::Local(_), None) => {}
        }

        if let Some(id) = id {
            self.doc.set_attribute(target, "id", id);
        }
        log::debug!("put '{path}' (append: {append})");
        Ok(target)
    }

    /// Detaches every child of `target` except text and CDATA.
    fn clear_markup(&mut self, target: NodeId) {
        let markup: Vec<NodeId> = self
            .doc
            .children(target)
            .filter(|&c| {
                !matches!(
                    self.doc.node(c).kind,
                    NodeKind::Text { .. } | NodeKind::CData { .. }
                )
            })
            .collect();
        for child in markup {
            self.doc.detach(child);
        }
    }

    /// Imports `node` of `src` as the last child of `target`. A document
    /// node contributes its children instead.
    fn graft(&mut self, target: NodeId, src: &Document, node: NodeId) {
        let tops: Vec<NodeId> = if matches!(src.node(node).kind, NodeKind::Document) {
            src.children(node).collect()
        } else {
            vec![node]
        };
        for top in tops {
            let copy = self.doc.import_subtree(src, top);
            self.doc.append_child(target, copy);
        }
    }

    /// Stores text at `path`.
    ///
    /// # Errors
    ///
    /// See [`put`](Self::put).
    pub fn put_text(&mut self, path: &str, text: &str, append: bool) -> Result<NodeId, LibraryError> {
        self.put(path, text, None, append)
    }

    /// Stores a number at `path`.
    ///
    /// # Errors
    ///
    /// See [`put`](Self::put).
    pub fn put_f64(
        &mut self,
        path: &str,
        value: f64,
        id: Option<&str>,
        append: bool,
    ) -> Result<NodeId, LibraryError> {
        self.put(path, value.to_string().as_str(), id, append)
    }

    /// Stores arbitrary bytes at `path`.
    ///
    /// With `compress` the bytes are gzipped and base64-encoded. Otherwise
    /// binary data is base64-encoded and text is stored as-is.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Encoding`] if encoding fails, or any error
    /// of [`put`](Self::put).
    pub fn put_bytes(
        &mut self,
        path: &str,
        bytes: &[u8],
        compress: bool,
        append: bool,
    ) -> Result<NodeId, LibraryError> {
        let scheme = if compress {
            Scheme::ZipBase64
        } else if encoding::is_binary(bytes) {
            Scheme::Base64
        } else {
            Scheme::Raw
        };
        let text = encoding::encode_text(bytes, scheme)?;
        self.put(path, text.as_str(), None, append)
    }

    /// Stores the contents of `file` at `path`, as [`put_bytes`](Self::put_bytes)
    /// does.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be read, or any error
    /// of [`put_bytes`](Self::put_bytes).
    pub fn put_file(
        &mut self,
        path: &str,
        file: impl AsRef<FsPath>,
        compress: bool,
        append: bool,
    ) -> Result<NodeId, LibraryError> {
        let file = file.as_ref();
        let bytes = fs::read(file).map_err(|e| LibraryError::io(file, e))?;
        self.put_bytes(path, &bytes, compress, append)
    }

    /// Detaches the element at `path` and returns it as a library of its
    /// own. Returns `None` if the path does not resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed, and
    /// [`LibraryError::Argument`] for the empty path.
    pub fn remove(&mut self, path: &str) -> Result<Option<Library>, LibraryError> {
        let parsed = parse_path(path)?;
        if parsed.is_empty() {
            return Err(LibraryError::argument("cannot remove the focus element"));
        }
        let Some(node) = resolve(&self.doc, self.focus, &parsed) else {
            return Ok(None);
        };
        let removed = Library::from_document(self.doc.extract(node));
        self.doc.detach(node);
        log::debug!("removed '{path}'");
        Ok(Some(removed))
    }

    /// Replaces the children of the element at `dst` with copies of the
    /// children of `src_path`, read from `src` or from this library.
    ///
    /// The destination is created if missing and keeps its attributes.
    /// Returns the destination element.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Argument`] if `src_path` does not resolve,
    /// and path errors for either path. The copy is not transactional: a
    /// destination created before a failure stays in the document.
    pub fn copy(
        &mut self,
        dst: &str,
        src_path: &str,
        src: Option<&Library>,
    ) -> Result<NodeId, LibraryError> {
        let snapshot = {
            let lib = src.unwrap_or(&*self);
            let Some(node) = lib.find(src_path)? else {
                return Err(LibraryError::argument(format!(
                    "copy source '{src_path}' not found"
                )));
            };
            lib.doc.extract(node)
        };

        let target = resolve_or_create(&mut self.doc, self.focus, &parse_path(dst)?)?;
        self.doc.clear_children(target);
        if let Some(top) = snapshot.first_child(snapshot.root()) {
            for child in snapshot.children(top).collect::<Vec<_>>() {
                let copy = self.doc.import_subtree(&snapshot, child);
                self.doc.append_child(target, copy);
            }
        }
        log::debug!("copied '{src_path}' to '{dst}'");
        Ok(target)
    }

    // --- Output ---

    /// Serializes the whole document, declaration included.
    #[must_use]
    pub fn to_text(&self) -> String {
        serialize(&self.doc)
    }

    /// Serializes the whole document with four-space indentation.
    #[must_use]
    pub fn to_pretty_text(&self) -> String {
        serialize_with_options(&self.doc, &SerializeOptions::default().indent(true))
    }

    /// Serializes the element at `path` without a declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn subtree_text(&self, path: &str, indent: bool) -> Result<Option<String>, PathError> {
        let options = SerializeOptions::default().indent(indent);
        Ok(self
            .find(path)?
            .map(|n| serialize_subtree(&self.doc, n, &options)))
    }

    /// Writes the indented document to `file`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be written.
    pub fn save(&self, file: impl AsRef<FsPath>) -> Result<(), LibraryError> {
        let file = file.as_ref();
        fs::write(file, self.to_pretty_text()).map_err(|e| LibraryError::io(file, e))
    }

    /// Writes the document to `run<seconds>.xml` in `dir`, named after the
    /// current Unix time, and returns the file's path.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be written.
    pub fn write_run(&self, dir: impl AsRef<FsPath>) -> Result<PathBuf, LibraryError> {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let file = dir.as_ref().join(format!("run{seconds}.xml"));
        self.save(&file)?;
        log::info!("wrote run file {}", file.display());
        Ok(file)
    }
}

/// Rejects text holding characters a document cannot represent, such as
/// C0 controls other than tab and line ends. Binary data goes through
/// [`Library::put_bytes`] instead.
fn check_text(text: &str, what: &str) -> Result<(), LibraryError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(LibraryError::argument(format!(
            "{what} holds U+{:04X}, which XML cannot represent",
            u32::from(c)
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RUN: &str = "<run><input>\
        <string id=\"test\"><current>abc</current></string>\
        <number id=\"n\"><current> 2.5 </current></number>\
        </input></run>";

    fn lib() -> Library {
        Library::parse_str(RUN).unwrap()
    }

    #[test]
    fn test_get() {
        let lib = lib();
        assert_eq!(lib.get("input.(test).current").unwrap().as_deref(), Some("abc"));
        assert_eq!(lib.get("input.string(test).current").unwrap().as_deref(), Some("abc"));
        assert_eq!(lib.get("input.missing").unwrap(), None);
        // An element holding only elements has empty text.
        assert_eq!(lib.get("input").unwrap().as_deref(), Some(""));
        assert!(lib.get("input..x").is_err());
    }

    #[test]
    fn test_get_is_exact_and_trimmed_variant() {
        let lib = lib();
        assert_eq!(lib.get("input.(n).current").unwrap().as_deref(), Some(" 2.5 "));
        assert_eq!(lib.get_trimmed("input.(n).current").unwrap().as_deref(), Some("2.5"));
        assert_eq!(lib.get_f64("input.(n).current").unwrap(), Some(2.5));
        assert!(matches!(
            lib.get_f64("input.(test).current"),
            Err(LibraryError::Argument(_))
        ));
    }

    #[test]
    fn test_put_replaces_and_appends() {
        let mut lib = lib();
        lib.put_text("input.(test).current", "xyz", false).unwrap();
        assert_eq!(lib.get("input.(test).current").unwrap().as_deref(), Some("xyz"));
        lib.put_text("input.(test).current", "123", true).unwrap();
        assert_eq!(lib.get("input.(test).current").unwrap().as_deref(), Some("xyz123"));
    }

    #[test]
    fn test_put_creates_path_and_sets_id() {
        let mut lib = lib();
        let node = lib.put("output.log", "done", Some("main"), false).unwrap();
        assert_eq!(lib.document().attribute(node, "id"), Some("main"));
        assert_eq!(lib.get("output.log(main)").unwrap().as_deref(), Some("done"));
    }

    #[test]
    fn test_put_empty_text_clears() {
        let mut lib = lib();
        let node = lib.put_text("input.(test).current", "", false).unwrap();
        assert_eq!(lib.document().first_child(node), None);
        assert_eq!(lib.get("input.(test).current").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_put_append_keeps_only_text() {
        let mut lib = Library::parse_str("<run><x>v1<child/><![CDATA[c]]></x></run>").unwrap();
        lib.put_text("x", "v2", true).unwrap();
        assert_eq!(
            lib.subtree_text("x", false).unwrap().as_deref(),
            Some("<x>v1<![CDATA[c]]>v2</x>")
        );
        assert_eq!(lib.get("x").unwrap().as_deref(), Some("v1cv2"));
    }

    #[test]
    fn test_put_rejects_characters_xml_cannot_hold() {
        let mut lib = Library::new("run");
        assert!(matches!(
            lib.put_text("x", "a\u{1}b", false),
            Err(LibraryError::Argument(_))
        ));
        assert!(matches!(
            lib.put("x", "ok", Some("a\u{0}"), false),
            Err(LibraryError::Argument(_))
        ));
        assert_eq!(lib.get("x").unwrap(), None);

        lib.put_bytes("x", b"a\x01b", false, false).unwrap();
        let reparsed = Library::parse_str(&lib.to_text()).unwrap();
        assert_eq!(reparsed.get_decoded("x").unwrap().unwrap(), b"a\x01b");
    }

    #[test]
    fn test_node_queries_ignore_foreign_ids() {
        let big = Library::parse_str("<run><a><b><c/><d/></b></a></run>").unwrap();
        let deep = big.element("a.b.d").unwrap().unwrap();
        let small = Library::new("run");
        assert_eq!(small.component_name(deep), None);
        assert_eq!(small.node_id(deep), None);
        assert_eq!(small.node_type(deep), None);
        assert_eq!(small.node_path(deep), None);
    }

    #[test]
    fn test_put_auto_number_twice() {
        let mut lib = Library::new("run");
        lib.put_text("bar#.x", "1", false).unwrap();
        lib.put_text("bar#.x", "2", false).unwrap();
        assert_eq!(lib.get("bar0.x").unwrap().as_deref(), Some("1"));
        assert_eq!(lib.get("bar1.x").unwrap().as_deref(), Some("2"));
        assert_eq!(lib.to_text(), "<?xml version=\"1.0\"?>\n<run><bar><x>1</x></bar><bar><x>2</x></bar></run>\n");
    }

    #[test]
    fn test_put_library_value_is_a_copy() {
        let mut lib = lib();
        let mut other = Library::parse_str("<curve id=\"c\"><xy>1 2</xy></curve>").unwrap();
        lib.put("output", &other, None, false).unwrap();
        other.put_text("xy", "changed", false).unwrap();
        assert_eq!(lib.get("output.curve(c).xy").unwrap().as_deref(), Some("1 2"));
    }

    #[test]
    fn test_put_local_node_into_its_own_subtree() {
        let mut lib = lib();
        let input = lib.element("input").unwrap().unwrap();
        lib.put("input.backup", PutValue::Local(input), None, false).unwrap();
        assert_eq!(
            lib.get("input.backup.input.(test).current").unwrap().as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_put_rejects_foreign_node() {
        let mut lib = lib();
        let small = Document::with_root_element("x");
        let big = Document::parse_str("<a><b/><c/><d/></a>").unwrap();
        let far = big.elements_by_tag(big.root(), "d")[0];
        assert!(matches!(
            lib.put("output", PutValue::Node(&small, far), None, false),
            Err(LibraryError::Argument(_))
        ));
    }

    #[test]
    fn test_put_cannot_create_anonymous() {
        let mut lib = lib();
        assert!(matches!(
            lib.put_text("output.(x)", "v", false),
            Err(LibraryError::Path(PathError::CannotCreate { .. }))
        ));
    }

    #[test]
    fn test_put_bytes_schemes() {
        let mut lib = Library::new("run");
        lib.put_bytes("plain", b"1 2 3", false, false).unwrap();
        assert_eq!(lib.get("plain").unwrap().as_deref(), Some("1 2 3"));

        lib.put_bytes("blob", b"\x00\x01\x02", false, false).unwrap();
        assert!(lib.get("blob").unwrap().unwrap().starts_with("@@RP-ENC:b64\n"));
        assert_eq!(lib.get_decoded("blob").unwrap().unwrap(), b"\x00\x01\x02");

        lib.put_bytes("zipped", b"text text text", true, false).unwrap();
        assert!(lib.get("zipped").unwrap().unwrap().starts_with("@@RP-ENC:zb64\n"));
        assert_eq!(lib.get_decoded("zipped").unwrap().unwrap(), b"text text text");
    }

    #[test]
    fn test_get_decoded_reports_corruption() {
        let mut lib = Library::new("run");
        lib.put_text("bad", "@@RP-ENC:b64\n!!!", false).unwrap();
        assert!(matches!(lib.get_decoded("bad"), Err(LibraryError::Encoding(_))));
        assert_eq!(lib.get_decoded("missing").unwrap(), None);
    }

    #[test]
    fn test_children() {
        let lib = Library::parse_str("<run><a/><b/>text<a/></run>").unwrap();
        assert_eq!(lib.children("", None).unwrap().unwrap().len(), 3);
        assert_eq!(lib.children("", Some("a")).unwrap().unwrap().len(), 2);
        assert_eq!(lib.children("zzz", None).unwrap(), None);

        let names = lib.children_as("", ResultFlavor::Component, None).unwrap().unwrap();
        let names: Vec<&str> = names.iter().filter_map(Flavored::as_text).collect();
        assert_eq!(names, vec!["a", "b", "a1"]);
    }

    #[test]
    fn test_element_flavors() {
        let lib = lib();
        let text = |flavor| {
            lib.element_as("input.string(test)", flavor)
                .unwrap()
                .and_then(|f| f.as_text().map(str::to_string))
        };
        assert_eq!(text(ResultFlavor::Component).as_deref(), Some("string(test)"));
        assert_eq!(text(ResultFlavor::Path).as_deref(), Some("input.string(test)"));
        assert_eq!(text(ResultFlavor::Type).as_deref(), Some("string"));
        assert_eq!(text(ResultFlavor::Id).as_deref(), Some("test"));
    }

    #[test]
    fn test_parent() {
        let lib = lib();
        let input = lib.element("input").unwrap();
        assert_eq!(lib.parent("input.(test)").unwrap(), input);
        assert_eq!(lib.parent("").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let mut lib = lib();
        let before = lib.subtree_text("input.(test)", false).unwrap().unwrap();
        let removed = lib.remove("input.(test)").unwrap().unwrap();
        assert_eq!(lib.get("input.(test).current").unwrap(), None);
        assert_eq!(removed.get("current").unwrap().as_deref(), Some("abc"));
        assert_eq!(removed.subtree_text("", false).unwrap().unwrap(), before);
        assert!(lib.remove("input.(test)").unwrap().is_none());
        assert!(matches!(lib.remove(""), Err(LibraryError::Argument(_))));
    }

    #[test]
    fn test_copy_within_library() {
        let mut lib = lib();
        lib.copy("output.saved", "input.(test)", None).unwrap();
        assert_eq!(lib.get("output.saved.current").unwrap().as_deref(), Some("abc"));
        // The source is untouched.
        assert_eq!(lib.get("input.(test).current").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_copy_from_child_into_focus() {
        let mut lib = lib();
        lib.copy("", "input", None).unwrap();
        assert_eq!(lib.get("(test).current").unwrap().as_deref(), Some("abc"));
        assert_eq!(lib.element("input").unwrap(), None);
    }

    #[test]
    fn test_copy_from_other_library_keeps_attributes() {
        let mut lib = lib();
        let other = Library::parse_str("<e><x>1</x><y>2</y></e>").unwrap();
        let target = lib.copy("input.estring(qqq)", "", Some(&other)).unwrap();
        assert_eq!(lib.document().attribute(target, "id"), Some("qqq"));
        assert_eq!(
            lib.subtree_text("input.estring(qqq)", false).unwrap().unwrap(),
            "<estring id=\"qqq\"><x>1</x><y>2</y></estring>"
        );
    }

    #[test]
    fn test_copy_missing_source() {
        let mut lib = lib();
        assert!(matches!(
            lib.copy("output.x", "input.nothing", None),
            Err(LibraryError::Argument(_))
        ));
        assert_eq!(lib.element("output").unwrap(), None);
    }

    #[test]
    fn test_open_inline_and_from_node() {
        let lib = Library::open("<?xml version=\"1.0\"?><run><a>1</a></run>").unwrap();
        assert_eq!(lib.get("a").unwrap().as_deref(), Some("1"));
        assert!(matches!(
            Library::open("/definitely/not/here.xml"),
            Err(LibraryError::Io { .. })
        ));

        let doc = Document::parse_str(RUN).unwrap();
        let input = doc.elements_by_tag(doc.root(), "input")[0];
        let sub = Library::from_node(doc, input).unwrap();
        assert_eq!(sub.get("(test).current").unwrap().as_deref(), Some("abc"));
        assert_eq!(sub.node_path(sub.focus()).as_deref(), Some("input"));
    }

    #[test]
    fn test_numbers_and_node_queries() {
        let mut lib = Library::new("run");
        let node = lib.put_f64("output.number(t).current", 2.5, None, false).unwrap();
        assert_eq!(lib.get_f64("output.(t).current").unwrap(), Some(2.5));
        assert_eq!(lib.node_type(node), Some("current"));
        assert_eq!(lib.node_id(node).as_deref(), Some("current"));
        assert_eq!(lib.component_name(node).as_deref(), Some("current"));

        let found = lib.element_as("output.(t)", ResultFlavor::Node).unwrap().unwrap();
        let number = found.as_node().unwrap();
        assert_eq!(lib.node_path(number).as_deref(), Some("output.number(t)"));

        let doc = lib.into_document();
        assert_eq!(doc.elements_by_tag(doc.root(), "number"), vec![number]);
    }

    #[test]
    fn test_pretty_text() {
        let lib = Library::parse_str("<run><a>1</a></run>").unwrap();
        assert_eq!(
            lib.to_pretty_text(),
            "<?xml version=\"1.0\"?>\n<run>\n    <a>1</a>\n</run>\n"
        );
    }
}
