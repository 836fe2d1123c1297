//! Single-branch path resolution and linear element creation
//!
//! Every step follows the *first* child carrying the next segment's name. The
//! multi-branch counterpart lives in [`crate::multipath`].

use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::matcher;
use crate::path::ElementPath;
use crate::requirement::ElementSpec;
use crate::xml::{Attributes, Document, Element, Route};

/// Result of walking a path from the root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    /// Route of the deepest matched element, `None` when the root itself differs
    pub deepest: Option<Route>,
    /// Index of the first unmatched segment (`path.len()` when fully resolved)
    pub matched: usize,
}

impl Prefix {
    pub fn is_complete(&self, path: &ElementPath) -> bool {
        self.matched == path.len()
    }
}

pub fn locate_prefix(doc: &Document, path: &ElementPath) -> Prefix {
    if path.segment(0) != Some(doc.root.name.as_str()) {
        return Prefix {
            deepest: None,
            matched: 0,
        };
    }

    let mut route = Route::new();
    let mut element = &doc.root;
    let mut matched = 1;
    for segment in path.segments().iter().skip(1) {
        let Some((index, child)) = element.first_element_named(segment) else {
            break;
        };
        route.push(index);
        element = child;
        matched += 1;
    }

    Prefix {
        deepest: Some(route),
        matched,
    }
}

/// Append a new chain for the unmatched suffix and stamp `attributes` on its leaf
///
/// When the whole path resolves, a new leaf is added beside the existing one.
pub fn create_always(doc: &mut Document, path: &ElementPath, attributes: &Attributes) -> Result<Route> {
    let prefix = locate_prefix(doc, path);
    let Some(mut parent) = prefix.deepest.clone() else {
        return Err(unresolvable(path));
    };

    let start = if prefix.is_complete(path) {
        parent.pop();
        path.len() - 1
    } else {
        prefix.matched
    };
    if start == 0 {
        return Err(unresolvable(path));
    }

    let suffix = path.segments().get(start..).unwrap_or_default();
    append_chain(doc, &parent, suffix, attributes, path)
}

/// Update the resolved element in place, or create the chain when unresolved
pub fn create_or_override(
    doc: &mut Document,
    path: &ElementPath,
    attributes: &Attributes,
) -> Result<Route> {
    let prefix = locate_prefix(doc, path);
    let complete = prefix.is_complete(path);
    let Some(route) = prefix.deepest else {
        return Err(unresolvable(path));
    };

    if complete {
        doc.set_attributes(&route, attributes)?;
        return Ok(route);
    }

    let suffix = path.segments().get(prefix.matched..).unwrap_or_default();
    append_chain(doc, &route, suffix, attributes, path)
}

/// Create only when no element on `path` already matches `attributes`
pub fn create_if_absent(
    doc: &mut Document,
    path: &ElementPath,
    attributes: &Attributes,
) -> Result<Option<Route>> {
    if matcher::exists(doc, path, attributes) {
        debug!(%path, "matching element already present");
        return Ok(None);
    }
    create_always(doc, path, attributes).map(Some)
}

/// Stamp the spec's attributes on every element on its path, creating one if none exist
///
/// Returns the number of elements touched.
pub fn override_all(doc: &mut Document, spec: &ElementSpec) -> Result<usize> {
    let routes = matcher::select_routes(doc, &spec.path);
    if routes.is_empty() {
        create_or_override(doc, &spec.path, &spec.attributes)?;
        return Ok(1);
    }

    for route in &routes {
        doc.set_attributes(route, &spec.attributes)?;
    }
    Ok(routes.len())
}

/// Remove every element on `path` whose attributes match; returns the count removed
pub fn remove_matching(doc: &mut Document, path: &ElementPath, attributes: &Attributes) -> usize {
    let mut routes: Vec<Route> = matcher::select_routes(doc, path)
        .into_iter()
        .filter(|route| {
            doc.element(route)
                .is_some_and(|element| matcher::matches(element, attributes))
        })
        .collect();

    // later siblings and deeper nodes first so earlier routes stay valid
    routes.sort_unstable_by(|a, b| b.cmp(a));

    let mut removed = 0;
    for route in routes {
        let Some((&index, parent)) = route.split_last() else {
            warn!(%path, "refusing to remove the document root");
            continue;
        };
        let Some(parent) = doc.element_mut(parent) else {
            continue;
        };
        if index < parent.children.len() {
            parent.children.remove(index);
            removed += 1;
        }
    }
    removed
}

/// Append `names` as a linear chain under `parent`; returns the leaf route
pub(crate) fn append_chain(
    doc: &mut Document,
    parent: &[usize],
    names: &[String],
    attributes: &Attributes,
    path: &ElementPath,
) -> Result<Route> {
    let Some((leaf_name, ancestors)) = names.split_last() else {
        return Err(unresolvable(path));
    };
    let chain = ancestors
        .iter()
        .rev()
        .fold(Element::new(leaf_name.as_str()), |child, name| {
            Element::new(name.as_str()).with_child(child)
        });

    let Some(parent_element) = doc.element_mut(parent) else {
        return Err(unresolvable(path));
    };
    let index = parent_element.append(chain);

    let mut route = parent.to_vec();
    route.push(index);
    route.resize(route.len() + ancestors.len(), 0);

    doc.set_attributes(&route, attributes)?;
    debug!(%path, depth = route.len(), "created element chain");
    Ok(route)
}

fn unresolvable(path: &ElementPath) -> Error {
    Error::new(ErrorKind::PathResolution {
        path: path.to_string(),
    })
}
