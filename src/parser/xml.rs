//! Recursive descent tree builder.
//!
//! Consumes a complete document and appends nodes to a fresh `Document`
//! as it goes. Whitespace in the prolog and epilog is dropped; whitespace
//! inside elements is kept unless `no_blanks` is set.

use crate::error::ParseError;
use crate::tree::{Attribute, Document, NodeId, NodeKind};

use super::input::Cursor;
use super::ParseOptions;

/// Builds a [`Document`] from text.
pub(crate) struct XmlParser<'a> {
    cursor: Cursor<'a>,
    doc: Document,
    no_blanks: bool,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        Self {
            cursor: Cursor::new(input, options.max_depth),
            doc: Document::new(),
            no_blanks: options.no_blanks,
        }
    }

    /// Parses the prolog, the root element and the trailing misc.
    pub fn parse(mut self) -> Result<Document, ParseError> {
        if self.at_declaration() {
            let decl = self.cursor.xml_declaration()?;
            self.doc.version = Some(decl.version);
            self.doc.encoding = decl.encoding;
            self.doc.standalone = decl.standalone;
        } else if self.cursor.skip_space() && self.at_declaration() {
            return Err(self
                .cursor
                .error("XML declaration must be at the start of the document"));
        }

        let root = self.doc.root();
        self.misc(root)?;
        if self.cursor.starts_with_ci(b"<!DOCTYPE") {
            self.cursor.skip_doctype()?;
            self.misc(root)?;
        }

        let starts_element = self.cursor.peek() == Some(b'<')
            && !matches!(self.cursor.peek_at(1), None | Some(b'!' | b'?'));
        if !starts_element {
            return Err(self.cursor.error("missing root element"));
        }
        self.element(root)?;

        self.misc(root)?;
        if !self.cursor.at_end() {
            return Err(self.cursor.error("content after document element"));
        }
        Ok(self.doc)
    }

    fn at_declaration(&self) -> bool {
        self.cursor.starts_with(b"<?xml")
            && self
                .cursor
                .peek_at(5)
                .is_some_and(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
    }

    fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.doc.create_node(kind);
        self.doc.append_child(parent, id);
        id
    }

    /// Comments, processing instructions and whitespace outside the root.
    fn misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.cursor.skip_space();
            if self.cursor.starts_with(b"<!--") {
                let content = self.cursor.comment()?;
                self.add(parent, NodeKind::Comment { content });
            } else if self.cursor.starts_with(b"<?") {
                self.processing_instruction(parent)?;
            } else {
                return Ok(());
            }
        }
    }

    fn processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let (target, data) = self.cursor.processing_instruction()?;
        self.add(parent, NodeKind::ProcessingInstruction { target, data });
        Ok(())
    }

    fn element(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.cursor.enter()?;
        self.cursor.eat(b"<")?;
        let name = self.cursor.name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let spaced = self.cursor.skip_space();
            if self.cursor.starts_with(b">") || self.cursor.starts_with(b"/>") {
                break;
            }
            if !spaced {
                return Err(self.cursor.error("whitespace required between attributes"));
            }
            let attr_name = self.cursor.name()?;
            if attributes.iter().any(|a| a.name == attr_name) {
                return Err(self
                    .cursor
                    .error(format!("duplicate attribute: '{attr_name}'")));
            }
            self.cursor.skip_space();
            self.cursor.eat(b"=")?;
            self.cursor.skip_space();
            let value = self.cursor.attribute_value()?;
            attributes.push(Attribute {
                name: attr_name,
                value,
            });
        }

        let id = self.add(
            parent,
            NodeKind::Element {
                name: name.clone(),
                attributes,
            },
        );
        if self.cursor.starts_with(b"/>") {
            self.cursor.bump(2);
        } else {
            self.cursor.eat(b">")?;
            self.content(id)?;
            self.cursor.eat(b"</")?;
            let end = self.cursor.name()?;
            if end != name {
                return Err(self.cursor.error(format!(
                    "mismatched end tag: expected </{name}>, found </{end}>"
                )));
            }
            self.cursor.skip_space();
            self.cursor.eat(b">")?;
        }
        self.cursor.leave();
        Ok(())
    }

    /// Everything between a start tag and its end tag.
    fn content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(self
                        .cursor
                        .error("unexpected end of input in element content"))
                }
                Some(b'<') => {
                    self.flush_text(parent, &mut text);
                    if self.cursor.starts_with(b"</") {
                        return Ok(());
                    } else if self.cursor.starts_with(b"<!--") {
                        let content = self.cursor.comment()?;
                        self.add(parent, NodeKind::Comment { content });
                    } else if self.cursor.starts_with(b"<![CDATA[") {
                        let content = self.cursor.cdata()?;
                        self.add(parent, NodeKind::CData { content });
                    } else if self.cursor.starts_with(b"<?") {
                        self.processing_instruction(parent)?;
                    } else {
                        self.element(parent)?;
                    }
                }
                Some(b'&') => text.push(self.cursor.reference()?),
                Some(b']') if self.cursor.starts_with(b"]]>") => {
                    return Err(self.cursor.error("']]>' not allowed in character data"));
                }
                Some(_) => text.push(self.cursor.take_char()?),
            }
        }
    }

    /// Appends pending character data to `parent` as one text node.
    fn flush_text(&mut self, parent: NodeId, text: &mut String) {
        let run = std::mem::take(text);
        if run.is_empty() || (self.no_blanks && run.chars().all(char::is_whitespace)) {
            return;
        }
        let id = self.doc.create_text(&run);
        self.doc.append_child(parent, id);
    }
}
