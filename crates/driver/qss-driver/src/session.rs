//! A compilation session over a bundle and its dependencies

use crate::analyze::{Analysis, analyze_script, deduplicate};
use crate::manifest::{Manifest, ManifestError};
use anyhow::{Context as _, Result, bail};
use indexmap::IndexMap;
use qss_ast::Script;
use qss_diagnostics::Message;
use qss_index::{DEFAULT_BUNDLE, Index, Indices, cache};
use qss_name::{QualifiedName, ScriptPath};
use qss_resolve::Resolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory under a bundle root holding the index cache
pub const CACHE_DIR: &str = ".qss/index";

type ScriptKey = (String, ScriptPath);

/// Parsed scripts of every loaded bundle and the indexes built from them
///
/// Scripts come from an external parser through [`Session::add_script`]. [`Session::index`]
/// rebuilds every package index, and [`Session::analyze_script`] then analyzes single scripts
/// against the result. The index store is shared, so analyses may run on other threads while
/// holding [`Session::indices`].
#[derive(Debug, Default)]
pub struct Session {
    indices: Arc<Indices>,
    roots: IndexMap<String, PathBuf>,
    scripts: IndexMap<String, IndexMap<ScriptPath, Script>>,
    index_messages: IndexMap<ScriptKey, Vec<Message>>,
    manifest: Manifest,
    manifest_messages: Vec<Message>,
    cache_dir: Option<PathBuf>,
}

impl Session {
    /// An empty session without a manifest or cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the bundle rooted at `root` and register its dependencies
    ///
    /// Invalid dependencies become messages, see [`Session::manifest_messages`]. The index cache
    /// lives under `<root>/.qss/index`.
    ///
    /// # Errors
    ///
    /// Fails if the bundle's `bundle.toml` cannot be read or parsed.
    #[tracing::instrument(skip_all, fields(root = %root.display()))]
    pub fn open(root: &Path) -> Result<Self> {
        let manifest = Manifest::find_in_dir(root)?;
        let mut session = Self {
            cache_dir: Some(root.join(CACHE_DIR)),
            ..Self::default()
        };
        session.add_bundle(manifest.name(), root);

        let (dependencies, errors) = manifest.dependency_roots(root);
        for (name, dependency_root) in dependencies {
            session.add_bundle(&name, dependency_root);
        }
        for error in &errors {
            tracing::warn!(%error, "invalid dependency");
        }
        session.manifest_messages = errors.iter().map(ManifestError::to_message).collect();
        session.manifest = manifest;
        tracing::info!(bundles = session.roots.len(), "opened bundle");
        Ok(session)
    }

    /// Use `cache_dir` for [`Session::write_cache`] and [`Session::load_cached`]
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// The shared index store
    #[must_use]
    pub fn indices(&self) -> Arc<Indices> {
        Arc::clone(&self.indices)
    }

    /// The manifest of the opened bundle, or the default one
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Problems found in `bundle.toml`, reported at its first character
    #[must_use]
    pub fn manifest_messages(&self) -> &[Message] {
        &self.manifest_messages
    }

    /// The name of the bundle being compiled
    #[must_use]
    pub fn main_bundle(&self) -> &str {
        self.roots
            .keys()
            .next()
            .map_or(DEFAULT_BUNDLE, String::as_str)
    }

    /// Every registered bundle with its root, the opened bundle first
    pub fn bundles(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.roots
            .iter()
            .map(|(name, root)| (name.as_str(), root.as_path()))
    }

    /// Register a bundle rooted at `root`
    pub fn add_bundle(&mut self, name: &str, root: impl Into<PathBuf>) {
        let root = root.into();
        self.indices.bundle_or_insert(name, root.clone());
        self.roots.entry(name.to_owned()).or_insert(root);
    }

    /// Add or replace a parsed script of `bundle`, returning the script it replaces
    ///
    /// Unknown bundles are registered with an empty root. Indexes are only rebuilt by
    /// [`Session::index`].
    pub fn add_script(&mut self, bundle: &str, script: Script) -> Option<Script> {
        if !self.roots.contains_key(bundle) {
            self.add_bundle(bundle, PathBuf::new());
        }
        self.scripts
            .entry(bundle.to_owned())
            .or_default()
            .insert(script.path.clone(), script)
    }

    /// Forget a script of `bundle`
    pub fn remove_script(&mut self, bundle: &str, path: &ScriptPath) -> Option<Script> {
        self.scripts.get_mut(bundle)?.shift_remove(path)
    }

    /// The parsed script at `path` in `bundle`
    #[must_use]
    pub fn script(&self, bundle: &str, path: &ScriptPath) -> Option<&Script> {
        self.scripts.get(bundle)?.get(path)
    }

    /// Messages the last [`Session::index`] reported for one script
    #[must_use]
    pub fn index_messages(&self, bundle: &str, path: &ScriptPath) -> &[Message] {
        self.index_messages
            .get(&(bundle.to_owned(), path.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rebuild the index of every package that has scripts in this session
    ///
    /// All name indexes are built first, in a private copy of the store, so that every package's
    /// names are known before any type is resolved. Each full index is then swapped into the
    /// shared store as soon as it is built; readers never see an index without types. Packages
    /// left without scripts are unloaded from bundles the session holds scripts for.
    #[tracing::instrument(skip_all)]
    pub fn index(&mut self) {
        self.index_messages.clear();
        let packages = group_packages(&self.scripts);

        let (staged, name_messages) = self.stage_names(&packages);
        for (key, messages) in name_messages {
            self.index_messages.entry(key).or_default().extend(messages);
        }

        let stale = stale_packages(&staged, &packages);
        for (bundle, package) in &stale {
            if let Some(store) = staged.bundle(bundle) {
                store.remove(package);
            }
        }

        for (bundle, package, scripts) in &packages {
            let resolver = Resolver::new(&staged);
            let mut index = Index::new(package.clone());
            for script in scripts {
                index.add_names(script);
            }
            for script in scripts {
                let messages = index.add_types(script, &resolver);
                self.index_messages
                    .entry((bundle.clone(), script.path.clone()))
                    .or_default()
                    .extend(messages);
            }
            staged.bundle_or_insert(bundle, self.root(bundle)).insert(index.clone());
            self.indices.bundle_or_insert(bundle, self.root(bundle)).insert(index);
        }

        for (bundle, package) in &stale {
            tracing::debug!(bundle, %package, "unloading package");
            if let Some(store) = self.indices.bundle(bundle) {
                store.remove(package);
            }
        }

        tracing::info!(packages = packages.len(), "indexed session");
    }

    /// A copy of the shared store with a name index for every package in `packages`
    ///
    /// Also returns the duplicate-name messages of each script. The shared store is not touched.
    fn stage_names(&self, packages: &[PackageScripts<'_>]) -> (Indices, Vec<(ScriptKey, Vec<Message>)>) {
        let staged = self.indices.fork();
        let mut messages = Vec::new();
        for (bundle, package, scripts) in packages {
            let mut index = Index::new(package.clone());
            for script in scripts {
                messages.push(((bundle.clone(), script.path.clone()), index.add_names(script)));
            }
            staged.bundle_or_insert(bundle, self.root(bundle)).insert(index);
        }
        (staged, messages)
    }

    /// Analyze one script against the current indexes
    ///
    /// The result includes the messages [`Session::index`] reported for the script. Returns `None`
    /// if the session has no such script.
    #[tracing::instrument(skip_all, fields(bundle = %bundle, path = %path))]
    pub fn analyze_script(&self, bundle: &str, path: &ScriptPath) -> Option<Analysis> {
        let script = self.script(bundle, path)?;
        let mut analysis = analyze_script(&self.indices, script);
        let mut messages = self.index_messages(bundle, path).to_vec();
        messages.append(&mut analysis.messages);
        analysis.messages = deduplicate(messages);
        Some(analysis)
    }

    /// Analyze every script of `bundle`, in path order
    pub fn analyze_bundle(&self, bundle: &str) -> Vec<(ScriptPath, Analysis)> {
        let Some(scripts) = self.scripts.get(bundle) else {
            return Vec::new();
        };
        let mut paths: Vec<&ScriptPath> = scripts.keys().collect();
        paths.sort();
        paths
            .into_iter()
            .filter_map(|path| Some((path.clone(), self.analyze_script(bundle, path)?)))
            .collect()
    }

    /// Write the indexes of every registered bundle to the cache directory
    ///
    /// # Errors
    ///
    /// Fails if no cache directory is set or a cache file cannot be written.
    pub fn write_cache(&self) -> Result<Vec<PathBuf>> {
        let cache_dir = self.cache_dir()?;
        let mut written = Vec::new();
        for name in self.roots.keys() {
            let Some(bundle) = self.indices.bundle(name) else {
                continue;
            };
            let path = cache::write_bundle(cache_dir, name, &bundle)
                .with_context(|| format!("Failed to write index cache of bundle {name}"))?;
            written.push(path);
        }
        Ok(written)
    }

    /// Replace the indexes of `bundle` with its cached ones
    ///
    /// Returns whether anything was cached. Useful for dependencies whose scripts are not loaded.
    ///
    /// # Errors
    ///
    /// Fails if no cache directory is set or the cache file exists but cannot be read.
    pub fn load_cached(&mut self, bundle: &str) -> Result<bool> {
        let cache_dir = self.cache_dir()?;
        let root = self.root(bundle);
        let Some(cached) = cache::read_bundle(cache_dir, bundle, &root)
            .with_context(|| format!("Failed to read index cache of bundle {bundle}"))?
        else {
            return Ok(false);
        };
        tracing::debug!(bundle, packages = cached.len(), "loaded cached bundle");
        self.indices.insert_bundle(bundle, cached);
        self.roots.entry(bundle.to_owned()).or_insert(root);
        Ok(true)
    }

    fn cache_dir(&self) -> Result<&Path> {
        let Some(cache_dir) = &self.cache_dir else {
            bail!("No index cache directory is configured");
        };
        Ok(cache_dir)
    }

    fn root(&self, bundle: &str) -> PathBuf {
        self.roots.get(bundle).cloned().unwrap_or_default()
    }
}

/// Bundle, package and the scripts making up the package
type PackageScripts<'script> = (String, QualifiedName, Vec<&'script Script>);

/// Scripts grouped by bundle and package, in the order they were added
fn group_packages(scripts: &IndexMap<String, IndexMap<ScriptPath, Script>>) -> Vec<PackageScripts<'_>> {
    let mut grouped: IndexMap<(String, QualifiedName), Vec<&Script>> = IndexMap::new();
    for (bundle, bundle_scripts) in scripts {
        for script in bundle_scripts.values() {
            grouped
                .entry((bundle.clone(), script.package.clone()))
                .or_default()
                .push(script);
        }
    }
    grouped
        .into_iter()
        .map(|((bundle, package), members)| (bundle, package, members))
        .collect()
}

/// Packages loaded in `indices` for a bundle in `packages` that no longer have scripts
fn stale_packages(indices: &Indices, packages: &[PackageScripts<'_>]) -> Vec<(String, QualifiedName)> {
    let mut stale = Vec::new();
    let mut bundles: Vec<&String> = packages.iter().map(|(bundle, _, _)| bundle).collect();
    bundles.dedup();
    for bundle in bundles {
        let Some(store) = indices.bundle(bundle) else {
            continue;
        };
        for loaded in store.snapshot() {
            let kept = packages
                .iter()
                .any(|(name, package, _)| name == bundle && package == loaded.package());
            if !kept && !stale.iter().any(|(name, package)| name == bundle && package == loaded.package()) {
                stale.push((bundle.clone(), loaded.package().clone()));
            }
        }
    }
    stale
}
