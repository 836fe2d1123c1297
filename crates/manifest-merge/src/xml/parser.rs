//! Markup parser implementation

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::cursor::Cursor;
use crate::xml::model::{Attributes, Content, Document, Element};

/// Limits applied while parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: usize,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 16 * 1024 * 1024,
        }
    }
}

impl ParserConfig {
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    pub const fn new(max_depth: usize, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// Markup parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: ParserConfig,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, ParserConfig::default())
    }

    pub const fn with_config(input: &'a [u8], config: ParserConfig) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse a complete document
    pub fn parse(&mut self) -> Result<Document> {
        if self.config.max_size > 0 && self.cursor.input_len() > self.config.max_size {
            return Err(Error::new(ErrorKind::MaxSizeExceeded {
                max: self.config.max_size,
            }));
        }

        self.skip_misc()?;
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here(ErrorKind::InvalidToken, "expected root element"));
        }
        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::TrailingContent, self.cursor.position()));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, declarations, processing instructions and comments outside the root
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat(b"<?") {
                self.take_until(b"?>")?;
            } else if self.cursor.eat(b"<!--") {
                self.take_until(b"-->")?;
            } else if self.cursor.eat(b"<!") {
                self.take_until(b">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.depth += 1;
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                self.cursor.position(),
            ));
        }

        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.eat(b"/>") {
            self.depth -= 1;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        loop {
            if self.cursor.eat(b"</") {
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(self.error_here(
                        ErrorKind::MismatchedTag {
                            expected: name,
                            found: close_name,
                        },
                        "mismatched closing tag",
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.eat(b"<!--") {
                let raw = self.take_until(b"-->")?;
                children.push(Content::Comment(bytes_to_string(raw)?));
                continue;
            }

            if self.cursor.eat(b"<![CDATA[") {
                let raw = self.take_until(b"]]>")?;
                children.push(Content::Text(bytes_to_string(raw)?));
                continue;
            }

            if self.cursor.eat(b"<?") {
                self.take_until(b"?>")?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                children.push(Content::Element(self.parse_element()?));
                continue;
            }

            if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated element"));
            }

            if let Some(text) = self.parse_text()? {
                children.push(Content::Text(text));
            }
        }

        self.depth -= 1;
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<Attributes> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) => {}
                None => return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated tag")),
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value"))
            }
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let raw = self.take_until(&[quote])?;
        let text = bytes_to_string(raw)?;
        decode_entities(&text).ok_or_else(|| Error::at(ErrorKind::InvalidEntity, pos))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let pos = self.cursor.position();
        let start = self.cursor.offset();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let text = bytes_to_string(self.cursor.slice_from(start))?;
        let text = decode_entities(&text).ok_or_else(|| Error::at(ErrorKind::InvalidEntity, pos))?;

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.offset();

        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            Some(_) => return Err(self.error_here(ErrorKind::InvalidToken, "expected name")),
            None => return Err(self.error_here(ErrorKind::UnexpectedEof, "expected name")),
        }
        while self.cursor.current().is_some_and(is_name_char) {
            self.cursor.advance();
        }

        bytes_to_string(self.cursor.slice_from(start))
    }

    fn take_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let pos = self.cursor.position();
        self.cursor
            .take_until(pattern)
            .ok_or_else(|| Error::with_message(ErrorKind::UnexpectedEof, "unterminated markup").located(pos))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.current() == Some(expected) {
            self.cursor.advance();
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error_here(ErrorKind::UnexpectedEof, "unexpected end of input"))
        } else {
            Err(self.error_here(
                ErrorKind::InvalidToken,
                &format!("expected '{}'", char::from(expected)),
            ))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        Error::with_message(kind, message).located(self.cursor.position())
    }
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::new(ErrorKind::InvalidUtf8))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Option<String> {
    if !input.contains('&') {
        return Some(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        result.push_str(rest.get(..amp)?);
        let after = rest.get(amp + 1..)?;
        let end = after.find(';')?;
        let entity = after.get(..end)?;
        let decoded = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => decode_numeric_entity(entity)?,
        };
        result.push(decoded);
        rest = after.get(end + 1..)?;
    }
    result.push_str(rest);
    Some(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
