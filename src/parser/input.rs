//! Cursor over the document text.
//!
//! [`Cursor`] owns the read position and the line/column bookkeeping, and
//! knows how to read the small lexical pieces of XML: names, references,
//! quoted values and the delimited bodies of comments, CDATA sections and
//! processing instructions.
//!
//! Only the five predefined entities and character references expand.
//! Nothing outside the document is ever read.

use crate::error::{ParseError, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Longest accepted element or attribute name, in bytes.
const MAX_NAME_LEN: usize = 50_000;

/// `Char`, XML 1.0 §2.2.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r' | ' '..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// `NameStartChar`, XML 1.0 §2.3.
fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
        || c == '_'
        || c == ':'
        || matches!(c,
            '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

/// `NameChar`, XML 1.0 §2.3.
fn is_name_part(c: char) -> bool {
    is_name_start(c)
        || c.is_ascii_digit()
        || matches!(c, '-' | '.' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Read position in a document, with nesting depth accounting.
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str, max_depth: u32) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Builds an error at the current position.
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn rest(&self) -> &'a str {
        self.text.get(self.pos..).unwrap_or("")
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, token: &[u8]) -> bool {
        self.rest().as_bytes().starts_with(token)
    }

    /// ASCII case-insensitive [`Cursor::starts_with`].
    pub fn starts_with_ci(&self, token: &[u8]) -> bool {
        self.rest()
            .as_bytes()
            .get(..token.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(token))
    }

    fn step(&mut self, c: char) {
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Moves past `count` characters.
    pub fn bump(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek_char() {
                Some(c) => self.step(c),
                None => return,
            }
        }
    }

    /// Reads one character. `\r\n` and lone `\r` read as `\n`.
    pub fn take_char(&mut self) -> Result<char, ParseError> {
        let c = self
            .peek_char()
            .ok_or_else(|| self.error("unexpected end of input"))?;
        if !is_xml_char(c) {
            return Err(self.error(format!("invalid XML character: U+{:04X}", u32::from(c))));
        }
        self.step(c);
        if c != '\r' {
            return Ok(c);
        }
        if self.peek() == Some(b'\n') {
            self.bump(1);
        }
        Ok('\n')
    }

    /// Consumes `token` or fails naming what was expected.
    pub fn eat(&mut self, token: &[u8]) -> Result<(), ParseError> {
        if !self.starts_with(token) {
            let found = self
                .peek_char()
                .map_or_else(|| "end of input".to_string(), |c| format!("'{c}'"));
            return Err(self.error(format!(
                "expected '{}', found {found}",
                String::from_utf8_lossy(token)
            )));
        }
        self.bump(token.len());
        Ok(())
    }

    /// Skips XML whitespace. Returns whether anything was skipped.
    pub fn skip_space(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_space) {
            self.bump(1);
        }
        self.pos > start
    }

    /// Enters an element.
    pub fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(self.error(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Reads a `Name`. Prefixed names such as `rp:run` come back whole.
    pub fn name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if is_name_start(c) => self.step(c),
            Some(c) => return Err(self.error(format!("invalid name start character: '{c}'"))),
            None => return Err(self.error("expected name, found end of input")),
        }
        while let Some(c) = self.peek_char().filter(|&c| is_name_part(c)) {
            self.step(c);
        }
        let name = &self.text[start..self.pos];
        if name.len() > MAX_NAME_LEN {
            return Err(self.error(format!("name of {} bytes is too long", name.len())));
        }
        Ok(name.to_string())
    }

    /// Reads `&name;` or `&#N;` / `&#xH;` and returns the character it
    /// stands for.
    pub fn reference(&mut self) -> Result<char, ParseError> {
        self.eat(b"&")?;
        if self.peek() != Some(b'#') {
            let name = self.name()?;
            self.eat(b";")?;
            return match name.as_str() {
                "lt" => Ok('<'),
                "gt" => Ok('>'),
                "amp" => Ok('&'),
                "apos" => Ok('\''),
                "quot" => Ok('"'),
                _ => Err(self.error(format!("unknown entity reference: &{name};"))),
            };
        }
        self.bump(1);
        let radix = if self.peek() == Some(b'x') {
            self.bump(1);
            16
        } else {
            10
        };
        let digits: String = self
            .rest()
            .chars()
            .take_while(|c| c.is_digit(radix))
            .collect();
        self.bump(digits.len());
        self.eat(b";")?;
        u32::from_str_radix(&digits, radix)
            .ok()
            .and_then(char::from_u32)
            .filter(|&c| is_xml_char(c))
            .ok_or_else(|| self.error(format!("invalid character reference: &#{digits};")))
    }

    fn open_quote(&mut self) -> Result<u8, ParseError> {
        match self.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.bump(1);
                Ok(q)
            }
            _ => Err(self.error("expected a quoted value")),
        }
    }

    /// Reads an attribute value, expanding references. Tabs and line ends
    /// become spaces.
    pub fn attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.open_quote()?;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.bump(1);
                    return Ok(value);
                }
                Some(b'<') => return Err(self.error("'<' not allowed in attribute values")),
                Some(b'&') => value.push(self.reference()?),
                Some(_) => match self.take_char()? {
                    '\n' | '\t' => value.push(' '),
                    c => value.push(c),
                },
            }
        }
    }

    /// Reads a quoted literal as is.
    fn literal(&mut self) -> Result<&'a str, ParseError> {
        let quote = char::from(self.open_quote()?);
        let body = self.rest();
        let len = body
            .find(quote)
            .ok_or_else(|| self.error("unterminated quoted value"))?;
        self.bump(body[..len].chars().count() + 1);
        Ok(&body[..len])
    }

    /// Reads characters up to `end` and consumes it.
    fn until(&mut self, end: &[u8], what: &str) -> Result<String, ParseError> {
        let mut body = String::new();
        while !self.starts_with(end) {
            if self.at_end() {
                return Err(self.error(format!("unexpected end of input in {what}")));
            }
            body.push(self.take_char()?);
        }
        self.bump(end.len());
        Ok(body)
    }

    /// `<!-- ... -->`, returning the body.
    pub fn comment(&mut self) -> Result<String, ParseError> {
        self.eat(b"<!--")?;
        let body = self.until(b"-->", "comment")?;
        if body.contains("--") || body.ends_with('-') {
            return Err(self.error("'--' not allowed inside comments"));
        }
        Ok(body)
    }

    /// `<![CDATA[ ... ]]>`, returning the body.
    pub fn cdata(&mut self) -> Result<String, ParseError> {
        self.eat(b"<![CDATA[")?;
        self.until(b"]]>", "CDATA section")
    }

    /// `<?target data?>`, returning the target and non-empty data.
    pub fn processing_instruction(&mut self) -> Result<(String, Option<String>), ParseError> {
        self.eat(b"<?")?;
        let target = self.name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.error("PI target 'xml' is reserved"));
        }
        if !self.skip_space() {
            self.eat(b"?>")?;
            return Ok((target, None));
        }
        let data = self.until(b"?>", "processing instruction")?;
        Ok((target, Some(data).filter(|d| !d.is_empty())))
    }

    /// Steps over `<!DOCTYPE ...>` and its internal subset.
    ///
    /// Literals and comments in the subset are read whole, since they may
    /// hold `]` or `>`.
    pub fn skip_doctype(&mut self) -> Result<(), ParseError> {
        self.bump("<!DOCTYPE".len());
        let mut in_subset = false;
        loop {
            match self.peek() {
                None => return Err(self.error("unexpected end of input in DOCTYPE")),
                Some(b'"' | b'\'') => {
                    self.literal()?;
                }
                Some(b'<') if in_subset && self.starts_with(b"<!--") => {
                    self.comment()?;
                }
                Some(b'[') if !in_subset => {
                    in_subset = true;
                    self.bump(1);
                }
                Some(b']') if in_subset => {
                    in_subset = false;
                    self.bump(1);
                }
                Some(b'>') if !in_subset => {
                    self.bump(1);
                    return Ok(());
                }
                Some(_) => {
                    self.take_char()?;
                }
            }
        }
    }

    /// `S? '=' S?` followed by a literal.
    fn pseudo_attribute_value(&mut self) -> Result<&'a str, ParseError> {
        self.skip_space();
        self.eat(b"=")?;
        self.skip_space();
        self.literal()
    }

    /// `<?xml version="1.0" encoding="..." standalone="..."?>`, XML 1.0 §2.8.
    pub fn xml_declaration(&mut self) -> Result<XmlDeclaration, ParseError> {
        self.eat(b"<?xml")?;
        if !self.skip_space() {
            return Err(self.error("whitespace required in XML declaration"));
        }
        self.eat(b"version")?;
        let version = self.pseudo_attribute_value()?;
        if !is_version_num(version) {
            return Err(self.error(format!("invalid version number: '{version}'")));
        }
        let mut decl = XmlDeclaration {
            version: version.to_string(),
            encoding: None,
            standalone: None,
        };

        loop {
            let spaced = self.skip_space();
            if self.starts_with(b"?>") {
                self.bump(2);
                return Ok(decl);
            }
            if !spaced {
                return Err(self.error("whitespace required in XML declaration"));
            }
            let name = self.name()?;
            match name.as_str() {
                "encoding" if decl.encoding.is_none() && decl.standalone.is_none() => {
                    let enc = self.pseudo_attribute_value()?;
                    if !is_enc_name(enc) {
                        return Err(self.error(format!("invalid encoding name: '{enc}'")));
                    }
                    decl.encoding = Some(enc.to_string());
                }
                "standalone" if decl.standalone.is_none() => {
                    decl.standalone = Some(match self.pseudo_attribute_value()? {
                        "yes" => true,
                        "no" => false,
                        _ => return Err(self.error("standalone must be 'yes' or 'no'")),
                    });
                }
                _ => return Err(self.error(format!("unexpected '{name}' in XML declaration"))),
            }
        }
    }
}

/// Fields of an XML declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_enc_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
