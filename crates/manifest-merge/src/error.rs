//! Error types for manifest-merge

use std::fmt;
use thiserror::Error;

/// Position in a source document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity,
    InvalidUtf8,
    TrailingContent,
    MaxDepthExceeded { max: usize },
    MaxSizeExceeded { max: usize },
    EmptyPath,
    PathResolution { path: String },
    TargetMismatch { expected: &'static str },
    Io { path: String, message: String },
}

impl ErrorKind {
    /// True for every kind raised while reading markup into a tree
    pub const fn is_malformed_document(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken
                | Self::UnexpectedEof
                | Self::MismatchedTag { .. }
                | Self::DuplicateAttribute { .. }
                | Self::InvalidEntity
                | Self::InvalidUtf8
                | Self::TrailingContent
                | Self::MaxDepthExceeded { .. }
                | Self::MaxSizeExceeded { .. }
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity => write!(f, "invalid entity reference"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::TrailingContent => write!(f, "content after root element"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::EmptyPath => write!(f, "element path must not be empty"),
            Self::PathResolution { path } => write!(f, "cannot resolve insertion point for {path}"),
            Self::TargetMismatch { expected } => write!(f, "expected {expected}"),
            Self::Io { path, message } => write!(f, "{path}: {message}"),
        }
    }
}

/// Main error type for manifest-merge
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    pos: Option<Pos>,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            pos: None,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            pos: None,
            message: message.into(),
        }
    }

    /// Create error at a specific position in the source
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind).located(pos)
    }

    pub fn located(mut self, pos: Pos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn pos(&self) -> Option<Pos> {
        self.pos
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_malformed_document(&self) -> bool {
        self.kind.is_malformed_document()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "error at {pos}: {}", self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

/// Result type alias for manifest-merge
pub type Result<T> = std::result::Result<T, Error>;
