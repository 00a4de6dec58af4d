//! Per-variable assignment and usage state

use qss_diagnostics::Message;
use qss_span::Range;
use qss_types::VariableType;

/// What is known about one variable at one point of a function
///
/// A variable is in exactly one of three states: never assigned (no assigning block),
/// unconditionally assigned (assigning blocks only) or conditionally assigned (both assigning
/// and non-assigning blocks). States are values; every transition returns a new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableUsageState {
    /// The variable's name
    pub name: String,
    /// Where the variable is declared
    pub definition: Range,
    /// The statement block that declares it
    pub block: Range,
    /// Blocks in which the variable is assigned
    pub assigned: Vec<Range>,
    /// Blocks in which the variable is not assigned
    pub not_assigned: Vec<Range>,
    /// Whether the variable was read anywhere
    pub used: bool,
    /// Declared or deduced type
    pub ty: VariableType,
}

impl VariableUsageState {
    /// A declared but never assigned variable
    #[must_use]
    pub fn new(name: impl Into<String>, definition: Range, block: Range, ty: VariableType) -> Self {
        Self {
            name: name.into(),
            definition,
            block,
            assigned: Vec::new(),
            not_assigned: Vec::new(),
            used: false,
            ty,
        }
    }

    /// Whether no path assigns the variable
    #[must_use]
    pub fn is_never_assigned(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Whether every path assigns the variable
    #[must_use]
    pub fn is_unconditionally_assigned(&self) -> bool {
        !self.assigned.is_empty() && self.not_assigned.is_empty()
    }

    /// Whether only some paths assign the variable
    #[must_use]
    pub fn is_conditionally_assigned(&self) -> bool {
        !self.assigned.is_empty() && !self.not_assigned.is_empty()
    }

    /// The state after assigning the variable at `at`
    #[must_use]
    pub fn assign(&self, at: Range) -> Self {
        Self {
            assigned: vec![at],
            not_assigned: Vec::new(),
            ..self.clone()
        }
    }

    /// The state after reading the variable at `at`, and the error if it may be unassigned there
    #[must_use]
    pub fn read(&self, at: Range) -> (Self, Option<Message>) {
        let error = if self.is_never_assigned() {
            Some(Message::error(
                at,
                format!("Variable {} was not assigned before use", self.name),
            ))
        } else if self.is_conditionally_assigned() {
            Some(Message::error(
                at,
                format!(
                    "Variable {} was not assigned on all paths before use{}",
                    self.name,
                    missing_blocks(&self.not_assigned)
                ),
            ))
        } else {
            None
        };
        (
            Self {
                used: true,
                ..self.clone()
            },
            error,
        )
    }

    /// The warning reported when the declaring block closes, if the variable was never read
    #[must_use]
    pub fn closing_warning(&self) -> Option<Message> {
        if self.used {
            return None;
        }
        let text = if self.is_never_assigned() {
            format!("Variable {} was never assigned", self.name)
        } else {
            format!("Variable {} was never used", self.name)
        };
        Some(Message::warning(self.definition, text))
    }

    /// The state after exactly one of several branches ran
    ///
    /// Each branch is identified by the range of its block. A branch that unconditionally assigns
    /// the variable is recorded as assigning, one that never assigns it as not assigning, and a
    /// branch that assigns it only on some paths contributes its own records. Returns `None` if
    /// there are no branches.
    #[must_use]
    pub fn parallel<'state>(
        branches: impl IntoIterator<Item = (Range, &'state Self)>,
    ) -> Option<Self> {
        let mut merged: Option<Self> = None;
        for (branch, state) in branches {
            let target = merged.get_or_insert_with(|| Self {
                assigned: Vec::new(),
                not_assigned: Vec::new(),
                used: false,
                ..state.clone()
            });
            if state.is_unconditionally_assigned() {
                target.assigned.push(branch);
            } else if state.is_conditionally_assigned() {
                target.assigned.extend_from_slice(&state.assigned);
                target.not_assigned.extend_from_slice(&state.not_assigned);
            } else {
                target.not_assigned.push(branch);
            }
            target.used |= state.used;
        }
        merged
    }
}

/// `. You must assign the variable in the following blocks: lines a-b, lines c-d`
#[must_use]
pub fn missing_blocks(blocks: &[Range]) -> String {
    let lines: Vec<String> = blocks
        .iter()
        .map(|block| format!("lines {}", block.line_span()))
        .collect();
    format!(
        ". You must assign the variable in the following blocks: {}",
        lines.join(", ")
    )
}
