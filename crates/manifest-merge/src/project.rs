//! Manifest files of an exported project and the pass that rewrites them

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::assembler::{AssemblerConfig, AssemblyReport, ManifestAssembler, Targets};
use crate::error::Result;
use crate::requirement::{LoaderId, RequirementProvider};
use crate::xml::Document;

pub const MANIFEST_FILE_NAME: &str = "AndroidManifest.xml";

/// Directory of the generated XR library, relative to project and package
pub const XR_LIBRARY_DIR: &str = "xrmanifest.androidlib";

/// Document locations of one exported project
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestFiles {
    library: PathBuf,
    xr_library: PathBuf,
    template: PathBuf,
}

impl ManifestFiles {
    /// Locations under `project`, with the XR library template read from `package`
    pub fn new(project: &Path, package: &Path) -> Self {
        Self {
            library: project.join("src").join("main").join(MANIFEST_FILE_NAME),
            xr_library: project.join(XR_LIBRARY_DIR).join(MANIFEST_FILE_NAME),
            template: package.join(XR_LIBRARY_DIR).join(MANIFEST_FILE_NAME),
        }
    }

    /// Read the XR library manifest from another template file
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    /// Library manifest, edited in place (the secondary document)
    pub fn library_manifest(&self) -> &Path {
        &self.library
    }

    /// Generated XR library manifest (the primary document)
    pub fn xr_library_manifest(&self) -> &Path {
        &self.xr_library
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Delete the library manifest so stale entries do not survive the next build
    ///
    /// A missing file is not an error. Returns true when a file was removed.
    pub fn cleanup(&self) -> bool {
        match std::fs::remove_file(&self.library) {
            Ok(()) => {
                debug!(path = %self.library.display(), "removed library manifest");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %self.library.display(), error = %e, "failed to clean up manifest");
                false
            }
        }
    }
}

/// Loads, assembles and writes back the manifests of one project
#[derive(Clone, Debug)]
pub struct ManifestProcessor {
    files: ManifestFiles,
    assembler: ManifestAssembler,
}

impl ManifestProcessor {
    pub fn new(files: ManifestFiles, config: AssemblerConfig) -> Self {
        Self {
            files,
            assembler: ManifestAssembler::new(config),
        }
    }

    pub fn files(&self) -> &ManifestFiles {
        &self.files
    }

    /// Run one pass; every document is loaded before any is modified
    /// and written at most once
    #[instrument(skip_all)]
    pub fn process(
        &self,
        providers: &[&dyn RequirementProvider],
        active_loaders: Option<&BTreeSet<LoaderId>>,
    ) -> Result<AssemblyReport> {
        if !self.assembler.config().split_manifest_supported {
            let mut library = Document::load(&self.files.library)?;
            let report = self
                .assembler
                .assemble(providers, active_loaders, Targets::Single(&mut library))?;
            if !report.skipped {
                library.save(&self.files.library)?;
                info!(path = %self.files.library.display(), "manifest written");
            }
            return Ok(report);
        }

        let mut xr_library = Document::load(&self.files.template)?;
        let mut library = Document::load(&self.files.library)?;
        let report = self.assembler.assemble(
            providers,
            active_loaders,
            Targets::Split {
                primary: &mut xr_library,
                secondary: &mut library,
            },
        )?;
        if report.skipped {
            return Ok(report);
        }

        xr_library.save(&self.files.xr_library)?;
        library.save(&self.files.library)?;
        info!(
            primary = %self.files.xr_library.display(),
            secondary = %self.files.library.display(),
            "manifests written"
        );
        Ok(report)
    }
}
