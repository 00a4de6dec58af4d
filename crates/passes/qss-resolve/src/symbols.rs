//! Side table from written names to what they refer to

use qss_name::QualifiedName;
use qss_span::{Location, Position, Range};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

/// The definition a written name resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTarget {
    /// Qualified name of the definition
    pub name: QualifiedName,
    /// Where the definition is
    pub location: Location,
    /// Its documentation comment
    pub documentation: Option<String>,
}

/// Resolved names of one script, keyed by the range of the written name
///
/// Used for hover and jump-to-definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMap {
    targets: FxHashMap<Range, SymbolTarget>,
}

impl SymbolMap {
    /// An empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the name written at `range`
    pub fn insert(&mut self, range: Range, target: SymbolTarget) {
        self.targets.insert(range, target);
    }

    /// What the name written at exactly `range` refers to
    #[must_use]
    pub fn get(&self, range: Range) -> Option<&SymbolTarget> {
        self.targets.get(&range)
    }

    /// The innermost bound name containing `position`
    ///
    /// Of two ranges spanning as many lines and ending at the same character, the one starting
    /// later wins.
    #[must_use]
    pub fn at(&self, position: Position) -> Option<(Range, &SymbolTarget)> {
        self.targets
            .iter()
            .filter(|(range, _)| range.contains(position))
            .min_by_key(|(range, _)| {
                (
                    range.end.line.saturating_sub(range.start.line),
                    range.end.character,
                    Reverse(range.start),
                )
            })
            .map(|(range, target)| (*range, target))
    }

    /// Number of bound names
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Every binding, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Range, &SymbolTarget)> {
        self.targets.iter()
    }
}
