//! Root-relative element paths

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Non-empty sequence of element names, root name first
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<String>", into = "Vec<String>")
)]
pub struct ElementPath(Vec<String>);

impl ElementPath {
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(Error::new(ErrorKind::EmptyPath));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for the `len` convention
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the element the path designates
    pub fn leaf(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.0.iter().any(|s| s == segment)
    }
}

impl TryFrom<Vec<String>> for ElementPath {
    type Error = Error;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Self::new(segments)
    }
}

impl From<ElementPath> for Vec<String> {
    fn from(path: ElementPath) -> Self {
        path.0
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
