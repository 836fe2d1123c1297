//! Property-based tests for the merge engine
//!
//! These tests use proptest to verify:
//! 1. Matching law: a node matches iff its attributes are a subset of the request
//! 2. Applying merged overrides twice equals applying them once
//! 3. Multi-branch creation adds exactly one leaf per unsatisfied branch

use proptest::prelude::*;

use manifest_merge::locator::override_all;
use manifest_merge::matcher::{matches, select};
use manifest_merge::merge::{dedupe, merge_overrides};
use manifest_merge::multipath::create_in_all_branches;
use manifest_merge::{
    Attributes, Document, Element, ElementPath, ElementSpec, Requirement, ANDROID_NAMESPACE,
};

/// Small key/value alphabets so generated maps overlap often
fn arb_attributes() -> impl Strategy<Value = Attributes> {
    prop::collection::vec(("[a-d]", "[xy]"), 0..4)
        .prop_map(|pairs| pairs.into_iter().collect::<Attributes>())
}

/// Per activity: whether it has an intent filter, and whether that holds the VR category
fn arb_activities() -> impl Strategy<Value = Vec<(bool, bool)>> {
    prop::collection::vec((any::<bool>(), any::<bool>()), 1..6)
}

fn manifest(activities: &[(bool, bool)]) -> Document {
    let application = activities
        .iter()
        .fold(Element::new("application"), |application, &(filter, vr)| {
            let mut activity = Element::new("activity").with_attribute("android:name", "A");
            if filter {
                let category = if vr { "VR" } else { "LAUNCHER" };
                activity = activity.with_child(
                    Element::new("intent-filter")
                        .with_child(Element::new("category").with_attribute("android:name", category)),
                );
            }
            application.with_child(activity)
        });
    Document::new(
        Element::new("manifest")
            .with_attribute("xmlns:android", ANDROID_NAMESPACE)
            .with_child(application),
    )
}

proptest! {
    #[test]
    fn prop_subset_matching_law(own in arb_attributes(), requested in arb_attributes()) {
        let element = own
            .iter()
            .fold(Element::new("node"), |e, (k, v)| e.with_attribute(format!("android:{k}"), v.clone()));
        let expected = own.iter().all(|(k, v)| requested.get(k) == Some(v));
        prop_assert_eq!(matches(&element, &requested), expected);

        let mut wider = requested.clone();
        wider.insert("zz".to_string(), "extra".to_string());
        if expected {
            prop_assert!(matches(&element, &wider));
        }
    }

    #[test]
    fn prop_override_twice_equals_once(
        activities in arb_activities(),
        first in arb_attributes(),
        second in arb_attributes(),
    ) {
        let path = ElementPath::new(["manifest", "application", "activity"])
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let specs = vec![
            ElementSpec::new(path.clone(), first),
            ElementSpec::new(path, second),
        ];
        let merged = merge_overrides(&specs);
        prop_assert_eq!(merged.len(), 1);

        let mut once = manifest(&activities);
        for spec in &merged {
            override_all(&mut once, spec).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        let mut twice = once.clone();
        for spec in &merged {
            override_all(&mut twice, spec).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_one_leaf_per_unsatisfied_branch(activities in arb_activities()) {
        let path = ElementPath::new(["manifest", "application", "activity", "intent-filter", "category"])
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let vr: Attributes = [("name".to_string(), "VR".to_string())].into_iter().collect();
        let mut doc = manifest(&activities);
        let before = select(&doc, &path).len();

        let created = create_in_all_branches(&mut doc, &path, &vr)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let unsatisfied = activities.iter().filter(|(filter, vr)| !(*filter && *vr)).count();
        prop_assert_eq!(created.len(), unsatisfied);
        prop_assert_eq!(select(&doc, &path).len(), before + unsatisfied);

        let again = create_in_all_branches(&mut doc, &path, &vr)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(again.is_empty());
    }

    #[test]
    fn prop_dedupe_collapses_copies(copies in 1usize..5, attributes in arb_attributes()) {
        let spec = ElementPath::new(["manifest", "application"])
            .map(|path| ElementSpec::new(path, attributes))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let requirement = Requirement::for_loaders(["openxr"]).with_override(spec);

        let unique = dedupe(vec![requirement.clone(); copies]);

        prop_assert_eq!(unique, vec![requirement]);
    }
}
