//! Markup data model
//!
//! Nodes are owned parent-to-child only. A node is addressed by its
//! [`Route`]: the child indices walked from the root, counted over
//! `children` (text and comments included). Routes are how a parent is
//! looked up without a back-pointer.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::parser::{Parser, ParserConfig};
use crate::xml::writer;

/// Namespace every engine-written attribute lives in
pub const ANDROID_NAMESPACE: &str = "http://schemas.android.com/apk/res/android";

/// Prefix declared on the root when a document binds none
pub const DEFAULT_PREFIX: &str = "android";

/// Ordered attribute map, keyed by name
pub type Attributes = IndexMap<String, String>;

/// Child indices from the root to a node
pub type Route = Vec<usize>;

/// Markup document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// Markup element
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Content>,
}

/// Markup content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
    Comment(String),
}

/// Local part of a qualified name (`android:name` -> `name`)
pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    /// Child elements paired with their index in `children`
    pub fn elements(&self) -> impl Iterator<Item = (usize, &Self)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(index, content)| match content {
                Content::Element(element) => Some((index, element)),
                _ => None,
            })
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (usize, &'a Self)> {
        self.elements().filter(move |(_, element)| element.name == name)
    }

    pub fn first_element_named<'a>(&'a self, name: &'a str) -> Option<(usize, &'a Self)> {
        self.elements_named(name).next()
    }

    /// Append a child element, returning its index
    pub fn append(&mut self, child: Self) -> usize {
        self.children.push(Content::Element(child));
        self.children.len() - 1
    }

    pub fn child(&self, index: usize) -> Option<&Self> {
        match self.children.get(index) {
            Some(Content::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self.children.get_mut(index) {
            Some(Content::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn descendant(&self, route: &[usize]) -> Option<&Self> {
        route
            .iter()
            .try_fold(self, |element, &index| element.child(index))
    }

    pub fn descendant_mut(&mut self, route: &[usize]) -> Option<&mut Self> {
        route
            .iter()
            .try_fold(self, |element, &index| element.child_mut(index))
    }

    /// Attribute value looked up by local name
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == local)
            .map(|(_, value)| value.as_str())
    }
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a document with default limits
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input.as_bytes()).parse()
    }

    pub fn parse_with_config(input: &str, config: ParserConfig) -> Result<Self> {
        Parser::with_config(input.as_bytes(), config).parse()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
        Self::parse(&content)
    }

    /// Write the document, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, &e))?;
        }
        std::fs::write(path, self.to_xml_string()).map_err(|e| Error::io(path, &e))
    }

    pub fn to_xml_string(&self) -> String {
        writer::write_document(self)
    }

    pub fn element(&self, route: &[usize]) -> Option<&Element> {
        self.root.descendant(route)
    }

    pub fn element_mut(&mut self, route: &[usize]) -> Option<&mut Element> {
        self.root.descendant_mut(route)
    }

    /// Prefix the root binds to [`ANDROID_NAMESPACE`], if any
    pub fn namespace_prefix(&self) -> Option<&str> {
        self.root.attributes.iter().find_map(|(key, value)| {
            key.strip_prefix("xmlns:")
                .filter(|_| value == ANDROID_NAMESPACE)
        })
    }

    /// Set namespaced attributes on the node at `route`
    ///
    /// Existing keys are overwritten in place, others are appended. Fails
    /// when the route does not address an element.
    pub fn set_attributes(&mut self, route: &[usize], attributes: &Attributes) -> Result<()> {
        if self.element(route).is_none() {
            return Err(Error::new(ErrorKind::PathResolution {
                path: format!("{route:?}"),
            }));
        }
        if attributes.is_empty() {
            return Ok(());
        }

        let prefix = self.declare_namespace();
        if let Some(element) = self.element_mut(route) {
            for (key, value) in attributes {
                element
                    .attributes
                    .insert(format!("{prefix}:{key}"), value.clone());
            }
        }
        Ok(())
    }

    fn declare_namespace(&mut self) -> String {
        if let Some(prefix) = self.namespace_prefix() {
            return prefix.to_string();
        }
        self.root.attributes.insert(
            format!("xmlns:{DEFAULT_PREFIX}"),
            ANDROID_NAMESPACE.to_string(),
        );
        DEFAULT_PREFIX.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            Element::new("manifest")
                .with_attribute("xmlns:android", ANDROID_NAMESPACE)
                .with_child(
                    Element::new("application")
                        .with_child(Element::new("activity").with_attribute("android:name", "A"))
                        .with_child(Element::new("activity").with_attribute("android:name", "B")),
                ),
        )
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("android:name"), "name");
        assert_eq!(local_name("package"), "package");
        assert_eq!(local_name("xmlns:android"), "android");
    }

    #[test]
    fn test_descendant_by_route() {
        let doc = sample();
        let second = doc.element(&[0, 1]).map(|e| e.attribute("name"));
        assert_eq!(second, Some(Some("B")));
        assert!(doc.element(&[0, 2]).is_none());
        assert_eq!(doc.element(&[]).map(|e| e.name.as_str()), Some("manifest"));
    }

    #[test]
    fn test_set_attributes_uses_bound_prefix() -> Result<()> {
        let mut doc = Document::new(
            Element::new("manifest").with_attribute("xmlns:a", ANDROID_NAMESPACE),
        );
        let mut attrs = Attributes::new();
        attrs.insert("exported".to_string(), "true".to_string());

        doc.set_attributes(&[], &attrs)?;
        assert_eq!(
            doc.root.attributes.get("a:exported").map(String::as_str),
            Some("true")
        );
        Ok(())
    }

    #[test]
    fn test_set_attributes_declares_namespace() -> Result<()> {
        let mut doc = Document::new(Element::new("manifest").with_child(Element::new("application")));
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), "x".to_string());

        doc.set_attributes(&[0], &attrs)?;
        assert_eq!(doc.namespace_prefix(), Some("android"));
        assert_eq!(doc.element(&[0]).and_then(|e| e.attribute("name")), Some("x"));
        Ok(())
    }

    #[test]
    fn test_set_attributes_rejects_stale_route() {
        let mut doc = sample();
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), "x".to_string());

        for attributes in [attrs, Attributes::new()] {
            let err = doc.set_attributes(&[0, 5], &attributes).err();
            assert!(matches!(
                err.as_ref().map(Error::kind),
                Some(ErrorKind::PathResolution { .. })
            ));
        }
        assert_eq!(doc, sample());
    }

    #[test]
    fn test_set_attributes_overwrites_in_place() -> Result<()> {
        let mut doc = sample();
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), "C".to_string());
        attrs.insert("exported".to_string(), "true".to_string());

        doc.set_attributes(&[0, 0], &attrs)?;
        let keys: Vec<&str> = doc
            .element(&[0, 0])
            .map(|e| e.attributes.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["android:name", "android:exported"]);
        Ok(())
    }
}
