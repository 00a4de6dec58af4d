//! Alternatives found while resolving a name
#![allow(
    clippy::min_ident_chars,
    reason = "T, U and V are conventional names for the carried values"
)]

use qss_diagnostics::{Message, Messenger};
use qss_name::BundleQualifiedName;
use qss_span::Range;

/// One definition a written name could refer to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveAlternative<T> {
    /// The definition
    pub value: T,
    /// Packages that must be imported for the definition to be visible
    pub imports: Vec<BundleQualifiedName>,
}

/// Everything a written name could refer to
///
/// `alternatives` are visible through the script's imports. `non_imported` is only filled when
/// there are no visible alternatives, and lists definitions that importing another package would
/// make visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult<T> {
    /// Visible alternatives
    pub alternatives: Vec<ResolveAlternative<T>>,
    /// Alternatives that need another import
    pub non_imported: Vec<ResolveAlternative<T>>,
}

impl<T> Default for ResolveResult<T> {
    fn default() -> Self {
        Self {
            alternatives: Vec::new(),
            non_imported: Vec::new(),
        }
    }
}

impl<T> ResolveResult<T> {
    /// A result with one visible alternative that needs no import
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            alternatives: vec![ResolveAlternative {
                value,
                imports: Vec::new(),
            }],
            non_imported: Vec::new(),
        }
    }

    /// The only visible alternative, if there is exactly one
    #[must_use]
    pub fn single(&self) -> Option<&ResolveAlternative<T>> {
        match self.alternatives.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Transform every alternative's value
    #[must_use]
    pub fn map<U>(self, mut transform: impl FnMut(T) -> U) -> ResolveResult<U> {
        let mut convert = |alternative: ResolveAlternative<T>| ResolveAlternative {
            value: transform(alternative.value),
            imports: alternative.imports,
        };
        ResolveResult {
            alternatives: self.alternatives.into_iter().map(&mut convert).collect(),
            non_imported: self.non_imported.into_iter().map(&mut convert).collect(),
        }
    }

    /// `; try one of the following:` and one `• import` line per distinct suggestion, or nothing
    #[must_use]
    pub fn import_suggestions(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for alternative in &self.non_imported {
            let packages: Vec<String> = alternative
                .imports
                .iter()
                .map(|import| import.name.to_string())
                .collect();
            let line = format!("\n\u{2022} import {}", packages.join(", "));
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
        if lines.is_empty() {
            String::new()
        } else {
            format!("; try one of the following:{}", lines.concat())
        }
    }

    /// Succeed with the single visible alternative, or report why there is not exactly one
    ///
    /// `subject` describes what was searched for, such as `struct Point`, and `describe` names an
    /// alternative in the ambiguity message.
    pub fn report(
        self,
        range: Range,
        subject: &str,
        describe: impl Fn(&ResolveAlternative<T>) -> String,
    ) -> Messenger<ResolveAlternative<T>> {
        match self.alternatives.len() {
            0 => Messenger::fail(vec![Message::error(
                range,
                format!("Could not resolve {subject}{}", self.import_suggestions()),
            )]),
            1 => match self.alternatives.into_iter().next() {
                Some(single) => Messenger::success(single),
                None => Messenger::fail(Vec::new()),
            },
            _ => {
                let possibilities: Vec<String> = self.alternatives.iter().map(describe).collect();
                Messenger::fail(vec![Message::error(
                    range,
                    format!(
                        "Reference to {subject} was ambiguous, possibilities were: {}",
                        possibilities.join(", ")
                    ),
                )])
            }
        }
    }
}

impl<T: Clone> ResolveResult<T> {
    /// Combine two independent results, e.g. the key and value of a map type
    ///
    /// Visible alternatives pair visible alternatives. Suggestions pair every alternative of both
    /// sides where at least one side needs an import.
    #[must_use]
    pub fn product<U: Clone, V>(
        self,
        other: ResolveResult<U>,
        build: impl Fn(T, U) -> V,
    ) -> ResolveResult<V> {
        let alternatives = pairs(&self.alternatives, &other.alternatives, &build);
        let non_imported = if alternatives.is_empty() {
            let left: Vec<_> = self.alternatives.iter().chain(&self.non_imported).cloned().collect();
            let right: Vec<_> = other.alternatives.iter().chain(&other.non_imported).cloned().collect();
            pairs(&left, &right, &build)
        } else {
            Vec::new()
        };
        ResolveResult {
            alternatives,
            non_imported,
        }
    }
}

fn pairs<T: Clone, U: Clone, V>(
    left: &[ResolveAlternative<T>],
    right: &[ResolveAlternative<U>],
    build: &impl Fn(T, U) -> V,
) -> Vec<ResolveAlternative<V>> {
    let mut combined = Vec::with_capacity(left.len() * right.len());
    for first in left {
        for second in right {
            let mut imports = first.imports.clone();
            for import in &second.imports {
                if !imports.contains(import) {
                    imports.push(import.clone());
                }
            }
            combined.push(ResolveAlternative {
                value: build(first.value.clone(), second.value.clone()),
                imports,
            });
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternative(value: &'static str, package: &str) -> ResolveAlternative<&'static str> {
        ResolveAlternative {
            value,
            imports: vec![BundleQualifiedName::new("bundle", package.parse().unwrap())],
        }
    }

    #[test]
    fn test_report_unresolved_lists_distinct_imports() {
        let result = ResolveResult {
            alternatives: Vec::new(),
            non_imported: vec![alternative("d::go", "d"), alternative("d::go", "d"), alternative("e::go", "e")],
        };
        let reported = result.report(Range::default(), "func go", |alt| alt.value.to_owned());
        assert_eq!(
            reported.messages()[0].message,
            "Could not resolve func go; try one of the following:\n\u{2022} import d\n\u{2022} import e"
        );
    }

    #[test]
    fn test_report_ambiguous_and_single() {
        let ambiguous = ResolveResult {
            alternatives: vec![alternative("a::go", "a"), alternative("c::go", "c")],
            non_imported: Vec::new(),
        };
        let reported = ambiguous.report(Range::default(), "func go", |alt| alt.value.to_owned());
        assert!(!reported.is_success());
        assert_eq!(
            reported.messages()[0].message,
            "Reference to func go was ambiguous, possibilities were: a::go, c::go"
        );

        let single = ResolveResult::resolved("a::go").report(Range::default(), "func go", |alt| {
            alt.value.to_owned()
        });
        assert_eq!(single.value().map(|alt| alt.value), Some("a::go"));
    }

    #[test]
    fn test_product_suggests_when_a_side_needs_an_import() {
        let key = ResolveResult::resolved("Int");
        let value = ResolveResult {
            alternatives: Vec::new(),
            non_imported: vec![alternative("d::S", "d")],
        };
        let map = key.product(value, |key, value| format!("{{{key} => {value}}}"));
        assert!(map.alternatives.is_empty());
        assert_eq!(map.non_imported.len(), 1);
        assert_eq!(map.non_imported[0].value, "{Int => d::S}");
        assert_eq!(map.import_suggestions(), "; try one of the following:\n\u{2022} import d");
    }
}
