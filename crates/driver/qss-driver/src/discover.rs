//! Finding packages and scripts on disk

use anyhow::{Context as _, Result};
use qss_name::{QualifiedName, SOURCE_DIR, ScriptPath};
use std::fs;
use std::path::Path;

/// Every package under `<root>/src`, parents before children, siblings sorted by name
///
/// Every directory is a package, including ones holding no scripts. Directories whose name starts
/// with a dot are skipped along with everything inside them. A bundle without a `src` directory
/// has no packages.
///
/// # Errors
///
/// Fails if a directory under `src` cannot be listed.
pub fn discover_packages(root: &Path) -> Result<Vec<QualifiedName>> {
    let mut packages = Vec::new();
    let source = root.join(SOURCE_DIR);
    if source.is_dir() {
        collect_packages(&source, &[], &mut packages)?;
    }
    Ok(packages)
}

/// Every script of the bundle at `root`, as paths relative to the root, sorted
///
/// # Errors
///
/// Fails if a directory under `src` cannot be listed.
pub fn discover_scripts(root: &Path) -> Result<Vec<ScriptPath>> {
    let mut scripts = Vec::new();
    let mut directories = vec![ScriptPath::new([SOURCE_DIR])];
    while let Some(directory) = directories.pop() {
        let full = root.join(directory.to_path_buf());
        if !full.is_dir() {
            continue;
        }
        for (name, is_dir) in list(&full)? {
            let path = directory.append(name.as_str());
            if is_dir {
                if !name.starts_with('.') {
                    directories.push(path);
                }
            } else if path.is_script() {
                scripts.push(path);
            }
        }
    }
    scripts.sort();
    Ok(scripts)
}

fn collect_packages(directory: &Path, parent: &[String], packages: &mut Vec<QualifiedName>) -> Result<()> {
    for (name, is_dir) in list(directory)? {
        if !is_dir || name.starts_with('.') {
            continue;
        }
        let mut segments = parent.to_vec();
        segments.push(name.clone());
        if let Ok(package) = QualifiedName::new(segments.iter().cloned()) {
            packages.push(package);
        }
        collect_packages(&directory.join(&name), &segments, packages)?;
    }
    Ok(())
}

/// Entries of `directory` as (file name, is directory), sorted by name
fn list(directory: &Path) -> Result<Vec<(String, bool)>> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("Failed to list directory: {}", directory.display()))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to list directory: {}", directory.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        found.push((name, entry.path().is_dir()));
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundle(files: &[&str]) -> TempDir {
        let root = TempDir::new().unwrap();
        for file in files {
            let path = root.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        root
    }

    #[test]
    fn test_packages_skip_dot_directories() {
        let root = bundle(&[
            "src/main/main.qss",
            "src/std/entity/spawn.qss",
            "src/std/.git/config",
            "src/.hidden/secret.qss",
            "src/top.qss",
        ]);
        let packages: Vec<String> = discover_packages(root.path())
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(packages, vec!["main", "std", "std::entity"]);
    }

    #[test]
    fn test_scripts() {
        let root = bundle(&[
            "src/main/main.qss",
            "src/main/notes.txt",
            "src/std/entity/spawn.qss",
            "src/.hidden/secret.qss",
        ]);
        let scripts: Vec<String> = discover_scripts(root.path())
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(scripts, vec!["src/main/main.qss", "src/std/entity/spawn.qss"]);
    }

    #[test]
    fn test_missing_source_directory() {
        let root = TempDir::new().unwrap();
        assert!(discover_packages(root.path()).unwrap().is_empty());
        assert!(discover_scripts(root.path()).unwrap().is_empty());
    }
}
