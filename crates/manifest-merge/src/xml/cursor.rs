//! Byte cursor with line/column tracking

use crate::error::Pos;

#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.input
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(pattern))
    }

    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Consume `pattern` if the input continues with it
    pub fn eat(&mut self, pattern: &[u8]) -> bool {
        if self.starts_with(pattern) {
            self.advance_by(pattern.len());
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.advance();
        }
    }

    /// Advance until `pattern` and return the bytes before it, consuming the pattern
    pub fn take_until(&mut self, pattern: &[u8]) -> Option<&'a [u8]> {
        let start = self.pos;
        while !self.is_eof() {
            if self.starts_with(pattern) {
                let taken = self.slice_from(start);
                self.advance_by(pattern.len());
                return Some(taken);
            }
            self.advance();
        }
        None
    }

    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    pub const fn input_len(&self) -> usize {
        self.input.len()
    }

    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub const fn offset(&self) -> usize {
        self.pos
    }

    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.pos).unwrap_or_default()
    }
}
