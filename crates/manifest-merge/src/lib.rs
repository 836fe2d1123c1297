//! manifest-merge - Declarative merge engine for Android manifest documents
//!
//! Providers describe the elements they need as [`Requirement`]s: elements to
//! add, attributes to override and elements to remove, each addressed by an
//! [`ElementPath`] from the document root. The [`ManifestAssembler`] filters
//! them by the active loaders and applies them to one or two documents.
//!
//! # Quick Start
//!
//! ```
//! use std::collections::BTreeSet;
//! use manifest_merge::{
//!     AssemblerConfig, Document, ElementSpec, LoaderId, ManifestAssembler, Requirement, Targets,
//! };
//! # fn main() -> Result<(), manifest_merge::Error> {
//! let mut doc = Document::parse("<manifest><application /></manifest>")?;
//! let requirement = Requirement::for_loaders(["openxr"]).with_new(ElementSpec::from_parts(
//!     ["manifest", "uses-feature"],
//!     [("name", "android.hardware.vr.headtracking")],
//! )?);
//! let active: BTreeSet<LoaderId> = [LoaderId::new("openxr")].into_iter().collect();
//!
//! let assembler = ManifestAssembler::new(AssemblerConfig::single_document());
//! let report = assembler.assemble(&[&requirement], Some(&active), Targets::Single(&mut doc))?;
//!
//! assert_eq!(report.created, 1);
//! assert!(doc
//!     .to_xml_string()
//!     .contains(r#"<uses-feature android:name="android.hardware.vr.headtracking" />"#));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result};

pub mod xml;
pub use xml::{Attributes, Content, Document, Element, Route, ANDROID_NAMESPACE};

pub mod path;
pub use path::ElementPath;

pub mod requirement;
pub use requirement::{ElementSpec, LoaderId, Requirement, RequirementProvider};

pub mod locator;
pub mod matcher;
pub mod merge;
pub mod multipath;

pub mod assembler;
pub use assembler::{AssemblerConfig, AssemblyReport, ManifestAssembler, Targets};

pub mod project;
pub use project::{ManifestFiles, ManifestProcessor};
