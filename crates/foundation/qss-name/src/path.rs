//! Script and package paths relative to a bundle root

use crate::QualifiedName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Name of the directory holding a bundle's sources
pub const SOURCE_DIR: &str = "src";

/// File extension of script files
pub const SCRIPT_EXTENSION: &str = "qss";

/// Path of a script file or package directory, relative to the bundle root
///
/// Unlike [`QualifiedName`] a script path may be empty, which denotes the bundle root itself.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ScriptPath {
    segments: Vec<String>,
}

impl ScriptPath {
    /// Create a path from its segments
    #[must_use]
    pub fn new<Segments, Segment>(segments: Segments) -> Self
    where
        Segments: IntoIterator<Item = Segment>,
        Segment: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a `/`-separated path such as `src/std/entity.qss`
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self::new(path.split('/').filter(|segment| !segment.is_empty()))
    }

    /// Convert a relative filesystem path, ignoring `.` components
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self::new(path.components().filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            Component::Prefix(_)
            | Component::RootDir
            | Component::CurDir
            | Component::ParentDir => None,
        }))
    }

    /// Convert back into a relative filesystem path
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// All segments, outermost first
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this path is the bundle root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The outermost segment
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The innermost segment, usually the file name
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// A new path with `segment` placed in front
    #[must_use]
    pub fn prepend(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment.into());
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// A new path with `segment` added at the end
    #[must_use]
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Drop the first segment; the empty path stays empty
    #[must_use]
    pub fn trim_first(&self) -> Self {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Drop the last segment; the empty path stays empty
    #[must_use]
    pub fn trim_last(&self) -> Self {
        let keep = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..keep].to_vec(),
        }
    }

    /// The package a script at this path belongs to
    ///
    /// `src/std/entity/spawn.qss` belongs to `std::entity`. Returns `None` for scripts placed
    /// directly in `src`, or for paths outside it.
    #[must_use]
    pub fn package_name(&self) -> Option<QualifiedName> {
        let (first, rest) = self.segments.split_first()?;
        if first != SOURCE_DIR {
            return None;
        }
        let (_file, directories) = rest.split_last()?;
        QualifiedName::new(directories.iter().cloned()).ok()
    }

    /// Whether the last segment names a script file
    #[must_use]
    pub fn is_script(&self) -> bool {
        self.last().is_some_and(|file| {
            Path::new(file)
                .extension()
                .is_some_and(|extension| extension == SCRIPT_EXTENSION)
        })
    }
}

impl fmt::Display for ScriptPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = ScriptPath::parse("src/std/entity.qss");
        assert_eq!(path.segments(), ["src", "std", "entity.qss"]);
        assert_eq!(path.to_string(), "src/std/entity.qss");
        assert_eq!(path.first(), Some("src"));
        assert_eq!(path.last(), Some("entity.qss"));
        assert!(path.is_script());
    }

    #[test]
    fn test_trim_on_empty_path() {
        let root = ScriptPath::default();
        assert!(root.trim_first().is_empty());
        assert!(root.trim_last().is_empty());
        assert_eq!(root.last(), None);
    }

    #[test]
    fn test_package_name_from_path() {
        let path = ScriptPath::parse("src/std/entity/spawn.qss");
        assert_eq!(path.package_name(), "std::entity".parse().ok());
        assert_eq!(ScriptPath::parse("src/main.qss").package_name(), None);
        assert_eq!(ScriptPath::parse("lib/a/b.qss").package_name(), None);
    }

    #[test]
    fn test_filesystem_round_trip() {
        let path = ScriptPath::from_path(Path::new("./src/std/entity.qss"));
        assert_eq!(path, ScriptPath::parse("src/std/entity.qss"));
        assert_eq!(ScriptPath::from_path(&path.to_path_buf()), path);
    }

    #[test]
    fn test_qualified_name_to_script_path() {
        let name: QualifiedName = "std::entity".parse().unwrap();
        assert_eq!(name.to_script_path().prepend(SOURCE_DIR).to_string(), "src/std/entity");
    }
}
