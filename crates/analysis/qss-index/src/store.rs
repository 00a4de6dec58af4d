//! The shared store of every loaded bundle's indexes

use crate::Index;
use dashmap::DashMap;
use qss_name::QualifiedName;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The name of the bundle being compiled, like `crate` in Rust
pub const DEFAULT_BUNDLE: &str = "bundle";

/// The package indexes of one bundle
#[derive(Debug)]
pub struct Bundle {
    root: PathBuf,
    packages: DashMap<QualifiedName, Arc<Index>>,
}

impl Bundle {
    /// An empty bundle rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages: DashMap::new(),
        }
    }

    /// The bundle's root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The index of `package`, if it is loaded
    #[must_use]
    pub fn get(&self, package: &QualifiedName) -> Option<Arc<Index>> {
        self.packages.get(package).map(|entry| Arc::clone(entry.value()))
    }

    /// Swap in a new index for its package, returning the one it replaced
    pub fn insert(&self, index: Index) -> Option<Arc<Index>> {
        self.packages.insert(index.package().clone(), Arc::new(index))
    }

    /// Unload `package`
    pub fn remove(&self, package: &QualifiedName) -> Option<Arc<Index>> {
        self.packages.remove(package).map(|(_, index)| index)
    }

    /// Number of loaded packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no package is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Every loaded index, sorted by package name
    ///
    /// The returned indexes are shared snapshots; no lock is held once this returns.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Index>> {
        let mut indexes: Vec<Arc<Index>> = self
            .packages
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        indexes.sort_by(|left, right| left.package().cmp(right.package()));
        indexes
    }
}

/// Every loaded bundle, by name
#[derive(Debug, Default)]
pub struct Indices {
    bundles: DashMap<String, Arc<Bundle>>,
}

impl Indices {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundle called `name`, creating it at `root` if it is not loaded yet
    pub fn bundle_or_insert(&self, name: &str, root: impl Into<PathBuf>) -> Arc<Bundle> {
        Arc::clone(
            self.bundles
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(Bundle::new(root)))
                .value(),
        )
    }

    /// The bundle called `name`, if it is loaded
    #[must_use]
    pub fn bundle(&self, name: &str) -> Option<Arc<Bundle>> {
        self.bundles.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// A detached copy sharing every loaded index
    ///
    /// Indexes swapped into the copy are not seen through `self`, and the other way around.
    #[must_use]
    pub fn fork(&self) -> Self {
        let forked = Self::new();
        for entry in self.bundles.iter() {
            let bundle = Bundle::new(entry.value().root());
            for index in entry.value().snapshot() {
                bundle.packages.insert(index.package().clone(), index);
            }
            forked.insert_bundle(entry.key().clone(), bundle);
        }
        forked
    }

    /// Replace or add a whole bundle
    pub fn insert_bundle(&self, name: impl Into<String>, bundle: Bundle) -> Option<Arc<Bundle>> {
        self.bundles.insert(name.into(), Arc::new(bundle))
    }

    /// The index of `package` in `bundle`, if both are loaded
    #[must_use]
    pub fn index(&self, bundle: &str, package: &QualifiedName) -> Option<Arc<Index>> {
        self.bundle(bundle)?.get(package)
    }

    /// Every loaded index with its bundle name, sorted by bundle then package
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Arc<Index>)> {
        let mut bundles: Vec<(String, Arc<Bundle>)> = self
            .bundles
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        bundles.sort_by(|left, right| left.0.cmp(&right.0));
        bundles
            .into_iter()
            .flat_map(|(name, bundle)| {
                bundle
                    .snapshot()
                    .into_iter()
                    .map(move |index| (name.clone(), index))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str) -> QualifiedName {
        name.parse().unwrap()
    }

    #[test]
    fn test_missing_bundle_or_package_is_none() {
        let indices = Indices::new();
        assert!(indices.bundle("std").is_none());
        let bundle = indices.bundle_or_insert("std", "/std");
        assert!(bundle.is_empty());
        assert!(indices.index("std", &package("a")).is_none());
    }

    #[test]
    fn test_insert_swaps_atomically() {
        let indices = Indices::new();
        let bundle = indices.bundle_or_insert(DEFAULT_BUNDLE, "/project");
        assert!(bundle.insert(Index::new(package("a"))).is_none());
        let before = indices.index(DEFAULT_BUNDLE, &package("a")).unwrap();

        let replaced = bundle.insert(Index::new(package("a"))).unwrap();
        assert!(Arc::ptr_eq(&before, &replaced));
        let after = indices.index(DEFAULT_BUNDLE, &package("a")).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_fork_shares_indexes_but_not_swaps() {
        let indices = Indices::new();
        let _previous = indices
            .bundle_or_insert(DEFAULT_BUNDLE, "/project")
            .insert(Index::new(package("a")));

        let forked = indices.fork();
        let shared = forked.index(DEFAULT_BUNDLE, &package("a")).unwrap();
        assert!(Arc::ptr_eq(&shared, &indices.index(DEFAULT_BUNDLE, &package("a")).unwrap()));
        assert_eq!(forked.bundle(DEFAULT_BUNDLE).unwrap().root(), Path::new("/project"));

        let _previous = forked
            .bundle_or_insert(DEFAULT_BUNDLE, "/project")
            .insert(Index::new(package("b")));
        assert!(indices.index(DEFAULT_BUNDLE, &package("b")).is_none());
        let _previous = indices.bundle_or_insert(DEFAULT_BUNDLE, "/project").remove(&package("a"));
        assert!(forked.index(DEFAULT_BUNDLE, &package("a")).is_some());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let indices = Indices::new();
        for (bundle, name) in [("zeta", "b"), ("alpha", "c"), ("zeta", "a"), ("alpha", "a::x")] {
            let _previous = indices
                .bundle_or_insert(bundle, format!("/{bundle}"))
                .insert(Index::new(package(name)));
        }
        let order: Vec<String> = indices
            .snapshot()
            .into_iter()
            .map(|(bundle, index)| format!("{bundle}${}", index.package()))
            .collect();
        assert_eq!(order, ["alpha$a::x", "alpha$c", "zeta$a", "zeta$b"]);
    }

    #[test]
    fn test_bundle_or_insert_keeps_existing_root() {
        let indices = Indices::new();
        let _first = indices.bundle_or_insert("std", "/first");
        let second = indices.bundle_or_insert("std", "/second");
        assert_eq!(second.root(), Path::new("/first"));
    }
}
