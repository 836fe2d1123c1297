//! Manifest assembly: applies every applicable requirement to the target documents

use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::locator;
use crate::merge::{dedupe, merge_overrides};
use crate::multipath;
use crate::path::ElementPath;
use crate::requirement::{ElementSpec, LoaderId, Requirement, RequirementProvider};
use crate::xml::{Attributes, Document, Route};

/// Route of the application entry activities
pub const ACTIVITY_PATH: [&str; 3] = ["manifest", "application", "activity"];

/// Activity name used for the classic application entry
pub const CLASSIC_ACTIVITY_NAME: &str = "com.unity3d.player.UnityPlayerActivity";

/// Activity name used for the alternate (game activity) application entry
pub const ALTERNATE_ACTIVITY_NAME: &str = "com.unity3d.player.UnityPlayerGameActivity";

const ACTIVITY_SEGMENT: &str = "activity";
const INTENT_FILTER_SEGMENT: &str = "intent-filter";

/// Settings for an assembly pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Route elements into a primary and a secondary document
    pub split_manifest_supported: bool,
    pub use_classic_activity_entry: bool,
    pub use_alternate_activity_entry: bool,
    pub classic_activity_name: String,
    pub alternate_activity_name: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            split_manifest_supported: true,
            use_classic_activity_entry: true,
            use_alternate_activity_entry: false,
            classic_activity_name: CLASSIC_ACTIVITY_NAME.to_string(),
            alternate_activity_name: ALTERNATE_ACTIVITY_NAME.to_string(),
        }
    }
}

impl AssemblerConfig {
    /// Single-document configuration
    pub fn single_document() -> Self {
        Self {
            split_manifest_supported: false,
            ..Self::default()
        }
    }

    pub fn with_activity_entries(mut self, classic: bool, alternate: bool) -> Self {
        self.use_classic_activity_entry = classic;
        self.use_alternate_activity_entry = alternate;
        self
    }
}

/// Documents a pass writes into
#[derive(Debug)]
pub enum Targets<'a> {
    Single(&'a mut Document),
    Split {
        primary: &'a mut Document,
        secondary: &'a mut Document,
    },
}

/// New-element specs sorted by where they are routed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buckets<'a> {
    /// Paths through both an activity and an intent filter
    pub intent_filter: Vec<&'a ElementSpec>,
    /// Paths through an activity but no intent filter
    pub activity: Vec<&'a ElementSpec>,
    pub other: Vec<&'a ElementSpec>,
}

impl<'a> Buckets<'a> {
    pub fn partition<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = &'a ElementSpec>,
    {
        let mut buckets = Self::default();
        for spec in specs {
            let in_activity = spec.path.contains(ACTIVITY_SEGMENT);
            if in_activity && spec.path.contains(INTENT_FILTER_SEGMENT) {
                buckets.intent_filter.push(spec);
            } else if in_activity {
                buckets.activity.push(spec);
            } else {
                buckets.other.push(spec);
            }
        }
        buckets
    }
}

/// Outcome of one pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// The loader state could not be resolved and nothing was touched
    pub skipped: bool,
    pub requirements: usize,
    pub activities: usize,
    pub created: usize,
    pub overridden: usize,
    pub removed: usize,
}

/// Applies requirements to one or two manifest documents
#[derive(Clone, Debug, Default)]
pub struct ManifestAssembler {
    config: AssemblerConfig,
}

impl ManifestAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Run one pass over the documents
    ///
    /// `active_loaders` of `None` means the loader state is unknown: a warning
    /// is logged and the documents are left untouched.
    #[instrument(skip_all, fields(split = self.config.split_manifest_supported))]
    pub fn assemble(
        &self,
        providers: &[&dyn RequirementProvider],
        active_loaders: Option<&BTreeSet<LoaderId>>,
        targets: Targets<'_>,
    ) -> Result<AssemblyReport> {
        self.check_targets(&targets)?;

        let requirements = dedupe(collect_requirements(providers));

        let Some(active) = active_loaders else {
            warn!("no active loader state found, manifest entries will not be updated");
            return Ok(AssemblyReport {
                skipped: true,
                ..AssemblyReport::default()
            });
        };

        let requirements: Vec<Requirement> = requirements
            .into_iter()
            .filter(|requirement| requirement.applies_to(active))
            .collect();
        debug!(count = requirements.len(), "applicable requirements");

        let report = match targets {
            Targets::Split { primary, secondary } => {
                self.assemble_split(&requirements, primary, secondary)?
            }
            Targets::Single(document) => self.assemble_single(&requirements, document)?,
        };

        info!(
            requirements = report.requirements,
            activities = report.activities,
            created = report.created,
            overridden = report.overridden,
            removed = report.removed,
            "manifest assembled"
        );
        Ok(report)
    }

    fn check_targets(&self, targets: &Targets<'_>) -> Result<()> {
        match (self.config.split_manifest_supported, targets) {
            (true, Targets::Single(_)) => Err(Error::new(ErrorKind::TargetMismatch {
                expected: "primary and secondary documents",
            })),
            (false, Targets::Split { .. }) => Err(Error::new(ErrorKind::TargetMismatch {
                expected: "a single document",
            })),
            _ => Ok(()),
        }
    }

    fn assemble_split(
        &self,
        requirements: &[Requirement],
        primary: &mut Document,
        secondary: &mut Document,
    ) -> Result<AssemblyReport> {
        let mut report = AssemblyReport {
            requirements: requirements.len(),
            ..AssemblyReport::default()
        };

        let buckets = Buckets::partition(requirements.iter().flat_map(|r| &r.new_elements));
        let overrides = merge_overrides(requirements.iter().flat_map(|r| &r.override_elements));
        let removals: Vec<&ElementSpec> = requirements
            .iter()
            .flat_map(|r| &r.remove_elements)
            .collect();

        let mut entries = Vec::new();
        if self.config.use_classic_activity_entry {
            entries.push(self.config.classic_activity_name.as_str());
        }
        if self.config.use_alternate_activity_entry {
            entries.push(self.config.alternate_activity_name.as_str());
        }
        let activities = create_activities(primary, &entries)?;
        report.activities = activities.len();

        // intent filters require exported activities
        if !buckets.intent_filter.is_empty() {
            let exported = attributes([("exported", "true")]);
            for route in &activities {
                primary.set_attributes(route, &exported)?;
            }
        }

        for spec in &buckets.other {
            locator::create_always(primary, &spec.path, &spec.attributes)?;
            report.created += 1;
        }

        for spec in &buckets.activity {
            report.created += multipath::create_in_all_branches(primary, &spec.path, &spec.attributes)?.len();
        }

        for spec in &overrides {
            report.overridden += locator::override_all(primary, spec)?;
        }

        for spec in &buckets.intent_filter {
            report.created +=
                multipath::create_in_all_branches(secondary, &spec.path, &spec.attributes)?.len();
        }

        for spec in removals {
            report.removed += locator::remove_matching(secondary, &spec.path, &spec.attributes);
        }

        Ok(report)
    }

    fn assemble_single(&self, requirements: &[Requirement], document: &mut Document) -> Result<AssemblyReport> {
        let mut report = AssemblyReport {
            requirements: requirements.len(),
            ..AssemblyReport::default()
        };

        let overrides = merge_overrides(requirements.iter().flat_map(|r| &r.override_elements));

        report.activities = create_activities(document, &[self.config.classic_activity_name.as_str()])?.len();

        for spec in requirements.iter().flat_map(|r| &r.new_elements) {
            locator::create_always(document, &spec.path, &spec.attributes)?;
            report.created += 1;
        }

        for spec in &overrides {
            report.overridden += locator::override_all(document, spec)?;
        }

        for spec in requirements.iter().flat_map(|r| &r.remove_elements) {
            report.removed += locator::remove_matching(document, &spec.path, &spec.attributes);
        }

        Ok(report)
    }
}

/// Gather the requirements of every provider that yields one
pub fn collect_requirements(providers: &[&dyn RequirementProvider]) -> Vec<Requirement> {
    providers
        .iter()
        .filter_map(|provider| provider.provide())
        .collect()
}

fn create_activities(document: &mut Document, names: &[&str]) -> Result<Vec<Route>> {
    let path = ElementPath::new(ACTIVITY_PATH)?;
    names
        .iter()
        .map(|&name| locator::create_always(document, &path, &attributes([("name", name)])))
        .collect()
}

fn attributes<const N: usize>(pairs: [(&str, &str); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
