//! Variable scopes and the state of the enclosing function

use crate::{FlowError, VariableUsageState};
use indexmap::IndexMap;
use qss_span::Range;
use qss_types::Purity;

/// Control-flow facts about the function at one point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionState {
    /// Whether every path to this point has returned
    pub returned_value: bool,
    /// Whether this point is inside a loop body
    pub in_loop: bool,
    /// Purity of the function being analyzed
    pub purity: Purity,
}

impl FunctionState {
    /// The state at the start of a function of the given purity
    #[must_use]
    pub fn new(purity: Purity) -> Self {
        Self {
            returned_value: false,
            in_loop: false,
            purity,
        }
    }
}

/// Every variable visible at one point of a function, plus the function state
///
/// Child scopes start as a copy of their parent. Changes made inside a branch only reach the
/// parent through [`ScopeTree::parallel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTree {
    variables: IndexMap<String, VariableUsageState>,
    result: Option<VariableUsageState>,
    /// Control-flow facts
    pub function: FunctionState,
}

impl ScopeTree {
    /// An empty scope for a function of the given purity
    #[must_use]
    pub fn new(purity: Purity) -> Self {
        Self {
            variables: IndexMap::new(),
            result: None,
            function: FunctionState::new(purity),
        }
    }

    /// The state of the visible variable `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableUsageState> {
        self.variables.get(name)
    }

    /// Declare or update a variable, returning the state it replaces
    pub fn insert(&mut self, state: VariableUsageState) -> Option<VariableUsageState> {
        self.variables.insert(state.name.clone(), state)
    }

    /// Drop a variable when its block closes
    pub fn remove(&mut self, name: &str) -> Option<VariableUsageState> {
        self.variables.shift_remove(name)
    }

    /// Names of every visible variable, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// The state of the function's return value, if it has one
    #[must_use]
    pub fn result(&self) -> Option<&VariableUsageState> {
        self.result.as_ref()
    }

    /// Replace the state of the function's return value
    pub fn set_result(&mut self, state: VariableUsageState) {
        self.result = Some(state);
    }

    /// The scope after exactly one of several branches ran
    ///
    /// Each branch is paired with the range identifying it in messages. The function counts as
    /// returned only if every branch returned; the loop flag is taken from the first branch.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::ScopeMismatch`] if the branches do not declare the same variables.
    pub fn parallel(branches: &[(Range, Self)]) -> Result<Self, FlowError> {
        let Some((_, first)) = branches.first() else {
            return Ok(Self::new(Purity::default()));
        };
        let expected = sorted_names(first);
        for (_, branch) in branches.iter().skip(1) {
            let found = sorted_names(branch);
            if found != expected {
                return Err(FlowError::ScopeMismatch { expected, found });
            }
        }

        let mut merged = first.clone();
        merged.function.returned_value = branches
            .iter()
            .all(|(_, branch)| branch.function.returned_value);
        for (name, state) in &mut merged.variables {
            let states = branches
                .iter()
                .filter_map(|(range, branch)| branch.get(name).map(|found| (*range, found)));
            if let Some(joined) = VariableUsageState::parallel(states) {
                *state = joined;
            }
        }
        merged.result = VariableUsageState::parallel(
            branches
                .iter()
                .filter_map(|(range, branch)| branch.result.as_ref().map(|found| (*range, found))),
        );
        Ok(merged)
    }
}

fn sorted_names(scope: &ScopeTree) -> Vec<String> {
    let mut names: Vec<String> = scope.names().map(str::to_owned).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use qss_span::Position;
    use qss_types::VariableType;

    fn lines(first: u32, last: u32) -> Range {
        Range::new(Position::new(first, 0), Position::new(last, 1))
    }

    fn scope_with(names: &[&str]) -> ScopeTree {
        let mut scope = ScopeTree::new(Purity::Impure);
        for name in names {
            assert!(
                scope
                    .insert(VariableUsageState::new(*name, lines(0, 0), lines(0, 9), VariableType::INT))
                    .is_none()
            );
        }
        scope
    }

    #[test]
    fn test_mismatched_branches_are_an_internal_error() {
        let error = ScopeTree::parallel(&[
            (lines(1, 2), scope_with(&["a", "b"])),
            (lines(3, 4), scope_with(&["a"])),
        ])
        .unwrap_err();
        assert_eq!(
            error,
            FlowError::ScopeMismatch {
                expected: vec!["a".to_owned(), "b".to_owned()],
                found: vec!["a".to_owned()],
            }
        );
    }

    #[test]
    fn test_merge_tracks_assignment_and_returns() {
        let before = scope_with(&["a"]);
        let mut then_branch = before.clone();
        let assigned = then_branch.get("a").unwrap().assign(lines(1, 1));
        assert!(then_branch.insert(assigned).is_some());
        then_branch.function.returned_value = true;

        let merged =
            ScopeTree::parallel(&[(lines(1, 2), then_branch), (lines(0, 3), before)]).unwrap();
        let state = merged.get("a").unwrap();
        assert!(state.is_conditionally_assigned());
        assert_eq!(state.not_assigned, [lines(0, 3)]);
        assert!(!merged.function.returned_value);
    }
}
