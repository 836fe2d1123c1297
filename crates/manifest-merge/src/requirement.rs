//! Requirement model supplied by manifest providers

use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::ElementPath;
use crate::xml::Attributes;

/// Opaque identifier of a loader a requirement applies to
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct LoaderId(String);

impl LoaderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LoaderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One desired element: where it lives and which attributes it carries
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementSpec {
    pub path: ElementPath,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Attributes,
}

impl ElementSpec {
    pub fn new(path: ElementPath, attributes: Attributes) -> Self {
        Self { path, attributes }
    }

    /// Build a spec from string slices
    pub fn from_parts<'a, P, A>(path: P, attributes: A) -> Result<Self>
    where
        P: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Ok(Self {
            path: ElementPath::new(path)?,
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

/// Bundle of element changes and the loaders they apply to
///
/// Equality is by value over every field; attribute maps compare as maps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Requirement {
    pub supported_loader_ids: BTreeSet<LoaderId>,
    pub new_elements: Vec<ElementSpec>,
    pub override_elements: Vec<ElementSpec>,
    pub remove_elements: Vec<ElementSpec>,
}

impl Requirement {
    pub fn for_loaders<I, L>(loaders: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<LoaderId>,
    {
        Self {
            supported_loader_ids: loaders.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_new(mut self, spec: ElementSpec) -> Self {
        self.new_elements.push(spec);
        self
    }

    pub fn with_override(mut self, spec: ElementSpec) -> Self {
        self.override_elements.push(spec);
        self
    }

    pub fn with_removal(mut self, spec: ElementSpec) -> Self {
        self.remove_elements.push(spec);
        self
    }

    pub fn applies_to(&self, active: &BTreeSet<LoaderId>) -> bool {
        !self.supported_loader_ids.is_disjoint(active)
    }
}

/// Source of a manifest requirement
pub trait RequirementProvider {
    fn provide(&self) -> Option<Requirement>;
}

impl RequirementProvider for Requirement {
    fn provide(&self) -> Option<Requirement> {
        Some(self.clone())
    }
}

impl RequirementProvider for Option<Requirement> {
    fn provide(&self) -> Option<Requirement> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_to_intersection() {
        let requirement = Requirement::for_loaders(["openxr", "oculus"]);
        let active: BTreeSet<LoaderId> = [LoaderId::new("oculus")].into_iter().collect();
        let inactive: BTreeSet<LoaderId> = [LoaderId::new("mock")].into_iter().collect();

        assert!(requirement.applies_to(&active));
        assert!(!requirement.applies_to(&inactive));
        assert!(!Requirement::default().applies_to(&active));
    }

    #[test]
    fn test_equality_ignores_attribute_order() -> Result<()> {
        let a = Requirement::for_loaders(["x"]).with_new(ElementSpec::from_parts(
            ["manifest", "application"],
            [("name", "a"), ("value", "b")],
        )?);
        let b = Requirement::for_loaders(["x"]).with_new(ElementSpec::from_parts(
            ["manifest", "application"],
            [("value", "b"), ("name", "a")],
        )?);
        assert_eq!(a, b);
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_wire_shape() -> std::result::Result<(), serde_json::Error> {
        let json = r#"{
            "supportedLoaderIds": ["openxr"],
            "newElements": [
                {"path": ["manifest", "application", "meta-data"],
                 "attributes": {"name": "custom-data", "value": "test-data"}}
            ]
        }"#;
        let requirement: Requirement = serde_json::from_str(json)?;

        assert!(requirement.supported_loader_ids.contains(&LoaderId::new("openxr")));
        assert_eq!(requirement.new_elements.len(), 1);
        assert!(requirement.override_elements.is_empty());
        let keys: Vec<&String> = requirement
            .new_elements
            .iter()
            .flat_map(|spec| spec.attributes.keys())
            .collect();
        assert_eq!(keys, ["name", "value"]);
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_wire_rejects_empty_path() {
        let json = r#"{"newElements": [{"path": [], "attributes": {}}]}"#;
        assert!(serde_json::from_str::<Requirement>(json).is_err());
    }
}
