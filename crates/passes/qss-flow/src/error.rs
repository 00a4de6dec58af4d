//! Internal errors of the dataflow analysis

/// Errors that mean the analyzer itself is inconsistent, not the analyzed code
///
/// These are never shown as source diagnostics. The caller logs them and skips the function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// Two branches being merged declared different variables
    #[error("the variables of two branches could not be matched: {expected:?} and {found:?}")]
    ScopeMismatch {
        /// Variables of the first branch, sorted
        expected: Vec<String>,
        /// Variables of the mismatching branch, sorted
        found: Vec<String>,
    },
}
