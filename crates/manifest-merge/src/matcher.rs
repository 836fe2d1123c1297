//! Attribute subset matching and multi-match path queries

use crate::path::ElementPath;
use crate::xml::{local_name, Attributes, Document, Element, Route};

/// True when every attribute on `element` appears in `requested` with the same value
///
/// Attributes are compared by local name. `requested` may hold keys the element
/// lacks; an attribute on the element missing from `requested` fails the match.
pub fn matches(element: &Element, requested: &Attributes) -> bool {
    element.attributes.iter().all(|(key, value)| {
        requested
            .get(local_name(key))
            .is_some_and(|wanted| wanted == value)
    })
}

/// Routes of every element reachable along `path`, in document order
pub fn select_routes(doc: &Document, path: &ElementPath) -> Vec<Route> {
    let mut segments = path.segments().iter();
    if segments.next().map(String::as_str) != Some(doc.root.name.as_str()) {
        return Vec::new();
    }

    let mut frontier: Vec<Route> = vec![Vec::new()];
    for segment in segments {
        frontier = frontier
            .iter()
            .filter_map(|route| doc.element(route).map(|element| (route, element)))
            .flat_map(|(route, element)| {
                element.elements_named(segment).map(move |(index, _)| {
                    let mut child = route.clone();
                    child.push(index);
                    child
                })
            })
            .collect();
        if frontier.is_empty() {
            break;
        }
    }
    frontier
}

/// Elements reachable along `path`, in document order
pub fn select<'a>(doc: &'a Document, path: &ElementPath) -> Vec<&'a Element> {
    select_routes(doc, path)
        .iter()
        .filter_map(|route| doc.element(route))
        .collect()
}

/// True when any element reachable along `path` matches `requested`
pub fn exists(doc: &Document, path: &ElementPath, requested: &Attributes) -> bool {
    select(doc, path)
        .into_iter()
        .any(|element| matches(element, requested))
}
