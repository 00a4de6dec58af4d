//! Function purity classes

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The execution context a function is declared for
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum Purity {
    /// Runs eagerly as soon as its inputs change
    #[display("eager")]
    Eager,
    /// Runs while building user interface
    #[display("ui")]
    Ui,
    /// Has no side effects
    #[display("pure")]
    Pure,
    /// May do anything
    #[default]
    #[display("impure")]
    Impure,
}

impl Purity {
    /// Whether a function of this purity may be called from a function of purity `caller`
    #[must_use]
    pub fn can_execute_inside(self, caller: Self) -> bool {
        match self {
            Self::Pure => true,
            Self::Impure => caller == Self::Impure,
            Self::Eager => matches!(caller, Self::Eager | Self::Impure),
            Self::Ui => caller == Self::Ui,
        }
    }
}
