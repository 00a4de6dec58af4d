//! Names as written in source

use qss_name::{QualifiedName, SEPARATOR};
use qss_span::Range;
use std::fmt;

/// A single identifier with its range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    /// The identifier text
    pub name: String,
    /// Where it was written
    pub range: Range,
}

impl Ident {
    /// Create an identifier
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.name)
    }
}

/// A possibly qualified name literal such as `go` or `a::go`
///
/// The range is the key under which resolution results are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    /// Written segments, at least one
    pub segments: Vec<String>,
    /// Where it was written
    pub range: Range,
}

impl Name {
    /// Create a name from its segments
    pub fn new<Segments, Segment>(segments: Segments, range: Range) -> Self
    where
        Segments: IntoIterator<Item = Segment>,
        Segment: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            range,
        }
    }

    /// Split `text` on `::`
    pub fn parse(text: &str, range: Range) -> Self {
        Self::new(text.split(SEPARATOR), range)
    }

    /// Whether the written segments are the tail of `name`
    ///
    /// `b::go` matches `a::b::go` but not `a::c::go`.
    #[must_use]
    pub fn matches(&self, name: &QualifiedName) -> bool {
        !self.segments.is_empty() && name.ends_with(&self.segments)
    }

    /// Whether this is the unqualified name `local`
    #[must_use]
    pub fn is_local(&self, local: &str) -> bool {
        matches!(self.segments.as_slice(), [only] if only == local)
    }

    /// The final segment
    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// The written name as a qualified name, if it is well formed
    #[must_use]
    pub fn to_qualified_name(&self) -> Option<QualifiedName> {
        QualifiedName::new(self.segments.iter().cloned()).ok()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join(SEPARATOR))
    }
}
