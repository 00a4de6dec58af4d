//! Global-scope name resolution for QSS
//!
//! A written name is looked up in every loaded bundle. Only packages the script imports (and its
//! own package) are searched at first; if nothing is found there, every package is searched so the
//! error can say what to import. Typed lookups for structs, traits, functions, fields, trait
//! impls and type expressions are built on top of [`Resolver::resolve_global_scope`].

mod resolver;
mod result;
mod suggest;
mod symbols;
mod traits;

pub use resolver::{Resolved, Resolver, resolve_type_parameters};
pub use result::{ResolveAlternative, ResolveResult};
pub use suggest::{levenshtein_distance, similar_names};
pub use symbols::{SymbolMap, SymbolTarget};
pub use traits::TraitChecker;
