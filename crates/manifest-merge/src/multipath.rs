//! Multi-branch element creation
//!
//! Replicates one element across every distinct branch of the tree the path
//! prefix can reach. The search runs breadth-first one level at a time, so all
//! branches are judged at the same depth and the set of insertion points does
//! not depend on sibling order. Creation happens only after the search drains,
//! and only appends, so recorded routes stay valid while chains are added.

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::locator::append_chain;
use crate::matcher::matches;
use crate::path::ElementPath;
use crate::xml::{Attributes, Document, Route};

/// Where a missing suffix gets attached
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertionPoint {
    /// Element the new chain is appended to
    pub route: Route,
    /// Index of the first path segment to create beneath it
    pub first_missing: usize,
}

/// Ensure every reachable branch carries a leaf matching `attributes`
///
/// Returns the routes of the leaves created, one per branch that lacked one.
pub fn create_in_all_branches(
    doc: &mut Document,
    path: &ElementPath,
    attributes: &Attributes,
) -> Result<Vec<Route>> {
    let points = find_insertion_points(doc, path, attributes)?;
    debug!(%path, branches = points.len(), "incomplete branches found");

    let mut created = Vec::with_capacity(points.len());
    for point in points {
        let Some(suffix) = path.segments().get(point.first_missing..) else {
            return Err(unresolvable(path));
        };
        created.push(append_chain(doc, &point.route, suffix, attributes, path)?);
    }
    Ok(created)
}

/// Breadth-first search for branches that lack a matching leaf
pub fn find_insertion_points(
    doc: &Document,
    path: &ElementPath,
    attributes: &Attributes,
) -> Result<Vec<InsertionPoint>> {
    let last = path.len() - 1;
    let mut points: Vec<InsertionPoint> = Vec::new();
    let mut record = |point: InsertionPoint| {
        if !points.contains(&point) {
            points.push(point);
        }
    };

    if path.segment(0) != Some(doc.root.name.as_str()) {
        // the root is kept; the whole path goes beneath it
        record(InsertionPoint {
            route: Route::new(),
            first_missing: 0,
        });
        return Ok(points);
    }

    let mut level: Vec<Route> = vec![Route::new()];
    let mut depth = 0;
    while !level.is_empty() {
        let mut next_level = Vec::new();

        for route in level {
            let Some(element) = doc.element(&route) else {
                return Err(unresolvable(path));
            };

            if depth == last && matches(element, attributes) {
                continue;
            }

            if depth == last || !element.has_elements() {
                if element.name != path.leaf() {
                    record(InsertionPoint {
                        route,
                        first_missing: depth + 1,
                    });
                    continue;
                }
                // near miss: the new leaf becomes a sibling of this node
                let Some((_, parent)) = route.split_last() else {
                    return Err(unresolvable(path));
                };
                record(InsertionPoint {
                    route: parent.to_vec(),
                    first_missing: depth,
                });
                continue;
            }

            let next_name = path.segment(depth + 1).unwrap_or_default();
            let candidates: Vec<usize> = element
                .elements_named(next_name)
                .map(|(index, _)| index)
                .collect();

            let satisfied = depth + 1 == last
                && candidates
                    .iter()
                    .filter_map(|&index| element.child(index))
                    .any(|child| matches(child, attributes));
            if satisfied {
                continue;
            }

            next_level.extend(candidates.into_iter().map(|index| {
                let mut child = route.clone();
                child.push(index);
                child
            }));
        }

        level = next_level;
        depth += 1;
    }

    Ok(points)
}

fn unresolvable(path: &ElementPath) -> Error {
    Error::new(ErrorKind::PathResolution {
        path: path.to_string(),
    })
}
