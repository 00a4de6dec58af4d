//! Structural type model for QSS
//!
//! [`VariableType`] is a closed, structurally recursive union of the language's types.
//! [`CastChecker`] decides whether a value of one type may be used where another is expected,
//! and [`Purity`] constrains which functions may call which.

mod cast;
mod purity;
mod ty;

pub use cast::{CastChecker, ImplLookup, NoImpls};
pub use purity::Purity;
pub use ty::{FunctionType, Primitive, VariableType};
