//! Compilation driver for QSS bundles
//!
//! Ties the front end together: reads `bundle.toml`, finds the packages and scripts of a bundle,
//! builds every package index in two passes (all names first, then all types), and analyzes
//! scripts against the result. Parsing is left to the caller, which hands parsed scripts to a
//! [`Session`].

mod analyze;
mod discover;
pub mod logging;
mod manifest;
mod session;
mod validate;

pub use analyze::{Analysis, BodyTypes, analyze_script};
pub use discover::{discover_packages, discover_scripts};
pub use manifest::{
    BundleSection, Dependency, DependencyTable, LogConfig, MANIFEST_FILE, Manifest, ManifestError,
};
pub use session::{CACHE_DIR, Session};
pub use validate::validate_items;
