//! On-disk cache of full indexes, one JSON file per bundle

use crate::{Bundle, Index};
use indexmap::IndexMap;
use qss_name::QualifiedName;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that occur while reading or writing the index cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache file or directory could not be accessed
    #[error("could not access index cache at {}", path.display())]
    Io {
        /// The file or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The cache file does not hold a valid bundle index
    #[error("index cache at {} is malformed", path.display())]
    Format {
        /// The offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// The cache file of `bundle` inside `cache_dir`
#[must_use]
pub fn cache_path(cache_dir: &Path, bundle: &str) -> PathBuf {
    cache_dir.join(format!("{bundle}.json"))
}

/// Write every package index of `bundle` to `<cache_dir>/<name>.json`
///
/// # Errors
///
/// Returns [`CacheError::Io`] if the directory or file cannot be written.
pub fn write_bundle(cache_dir: &Path, name: &str, bundle: &Bundle) -> Result<PathBuf, CacheError> {
    fs::create_dir_all(cache_dir).map_err(|source| CacheError::Io {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    let packages: IndexMap<QualifiedName, Index> = bundle
        .snapshot()
        .into_iter()
        .map(|index| (index.package().clone(), Index::clone(&index)))
        .collect();
    let path = cache_path(cache_dir, name);
    let json = serde_json::to_string_pretty(&packages).map_err(|source| CacheError::Format {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| CacheError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(bundle = name, packages = packages.len(), path = %path.display(), "wrote index cache");
    Ok(path)
}

/// Read the cached indexes of bundle `name`, rooted at `root`
///
/// Returns `Ok(None)` if nothing is cached for the bundle.
///
/// # Errors
///
/// Returns [`CacheError::Io`] if the file exists but cannot be read and [`CacheError::Format`]
/// if its contents are not a bundle index.
pub fn read_bundle(cache_dir: &Path, name: &str, root: &Path) -> Result<Option<Bundle>, CacheError> {
    let path = cache_path(cache_dir, name);
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(CacheError::Io { path, source }),
    };
    let packages: IndexMap<QualifiedName, Index> =
        serde_json::from_str(&json).map_err(|source| CacheError::Format {
            path: path.clone(),
            source,
        })?;
    let bundle = Bundle::new(root);
    for index in packages.into_values() {
        let _replaced = bundle.insert(index);
    }
    tracing::debug!(bundle = name, packages = bundle.len(), "read index cache");
    Ok(Some(bundle))
}
