//! Requirement deduplication and override merging

use indexmap::IndexMap;

use crate::path::ElementPath;
use crate::requirement::{ElementSpec, Requirement};
use crate::xml::Attributes;

/// Drop value-identical requirements, keeping the first occurrence
pub fn dedupe(requirements: Vec<Requirement>) -> Vec<Requirement> {
    let mut unique: Vec<Requirement> = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        if !unique.contains(&requirement) {
            unique.push(requirement);
        }
    }
    unique
}

/// Fold override specs into one spec per distinct path
///
/// Paths keep the order they were first seen in. Within a path, identical
/// `(key, value)` pairs collapse first; a key seen again with another value is
/// overwritten by the later one.
pub fn merge_overrides<'a, I>(specs: I) -> Vec<ElementSpec>
where
    I: IntoIterator<Item = &'a ElementSpec>,
{
    let mut grouped: IndexMap<&ElementPath, Vec<(&String, &String)>> = IndexMap::new();
    for spec in specs {
        let pairs = grouped.entry(&spec.path).or_default();
        for pair in &spec.attributes {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }

    grouped
        .into_iter()
        .map(|(path, pairs)| {
            let attributes: Attributes = pairs
                .into_iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            ElementSpec::new(path.clone(), attributes)
        })
        .collect()
}
