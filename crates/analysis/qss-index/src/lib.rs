//! Multi-tier symbol index for QSS
//!
//! Each package has one [`Index`], built in two phases (names first, then resolved types) from
//! the package's scripts. A [`Bundle`] maps package names to shared indexes and [`Indices`] maps
//! bundle names to bundles. Both maps are concurrent, and a package's index is only ever replaced
//! as a whole, so readers never observe a half-built index.

pub mod cache;
mod index;
mod resolver;
mod store;

pub use cache::CacheError;
pub use index::{
    FieldDefinition, FuncDefinition, Index, IndexPhase, StructDefinition, TraitDefinition,
    TraitImplDefinition, signature_type,
};
pub use resolver::TypeResolver;
pub use store::{Bundle, DEFAULT_BUNDLE, Indices};
