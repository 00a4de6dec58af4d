//! Qualified names for packages, definitions and scripts
//!
//! A [`QualifiedName`] is the `::`-separated path of a package or of a definition inside one.
//! A [`BundleQualifiedName`] additionally names the bundle that owns it, which makes it globally
//! unique. Script files are addressed by a [`ScriptPath`] relative to their bundle root.

mod path;

pub use path::{SCRIPT_EXTENSION, SOURCE_DIR, ScriptPath};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the segments of a qualified name
pub const SEPARATOR: &str = "::";

/// Errors produced when constructing names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// A qualified name must have at least one segment
    #[error("qualified name must have at least one segment")]
    NoSegments,

    /// Segments may not be empty strings
    #[error("qualified name `{name}` contains an empty segment")]
    EmptySegment {
        /// The offending name as written
        name: String,
    },
}

/// An ordered, non-empty sequence of name segments such as `std::entity::spawn`
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Create a qualified name from its segments
    ///
    /// # Errors
    ///
    /// Returns [`NameError::NoSegments`] if `segments` is empty and
    /// [`NameError::EmptySegment`] if any segment is the empty string.
    pub fn new<Segments, Segment>(segments: Segments) -> Result<Self, NameError>
    where
        Segments: IntoIterator<Item = Segment>,
        Segment: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NameError::NoSegments);
        }
        if segments.iter().any(String::is_empty) {
            return Err(NameError::EmptySegment {
                name: segments.join(SEPARATOR),
            });
        }
        Ok(Self { segments })
    }

    /// All segments, outermost first
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (always at least one)
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; present for API symmetry with collections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The outermost segment
    #[must_use]
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The innermost segment, usually the definition's own name
    #[must_use]
    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// A new name with `segment` placed in front
    #[must_use]
    pub fn prepend(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment.into());
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// A new name with `segment` added at the end
    #[must_use]
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Drop the first segment, or `None` if only one segment remains
    #[must_use]
    pub fn trim_first(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[1..].to_vec(),
        })
    }

    /// Drop the last segment, or `None` if only one segment remains
    #[must_use]
    pub fn trim_last(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether the trailing segments of `self` equal all of `tail`
    ///
    /// `std::entity::spawn` ends with `spawn` and with `entity::spawn`.
    #[must_use]
    pub fn ends_with(&self, tail: &[String]) -> bool {
        self.segments.ends_with(tail)
    }

    /// The path of this package's directory, relative to a bundle's `src` directory
    #[must_use]
    pub fn to_script_path(&self) -> ScriptPath {
        ScriptPath::new(self.segments.iter().cloned())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join(SEPARATOR))
    }
}

impl FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::new(name.split(SEPARATOR))
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = NameError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

/// A qualified name paired with the bundle that defines it
///
/// This is the only globally unique identifier for a definition.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BundleQualifiedName {
    /// Name of the owning bundle
    pub bundle: String,
    /// Name within the bundle
    pub name: QualifiedName,
}

impl BundleQualifiedName {
    /// Pair a bundle with a name
    #[must_use]
    pub fn new(bundle: impl Into<String>, name: QualifiedName) -> Self {
        Self {
            bundle: bundle.into(),
            name,
        }
    }
}

impl fmt::Display for BundleQualifiedName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}${}", self.bundle, self.name)
    }
}
