//! Abstract syntax tree for QSS scripts
//!
//! The tree is produced by an external parser and is never mutated by analysis; every pass
//! records its results in side tables keyed by [`ExprId`] or by name [`Range`]s instead.
//! Function bodies allocate their statements and expressions in arenas, see [`Body`].
//!
//! [`Range`]: qss_span::Range

mod body;
mod item;
mod name;
mod ty;

pub use body::{
    BinaryOp, Body, BodyBuilder, Expr, ExprId, Literal, MaybeOp, Stmt, StmtId, StructFieldInit,
    UnaryOp,
};
pub use item::{
    Field, Func, FuncBody, FuncHook, HookTime, Import, NewStructHook, Param, Script, SetHook,
    Signature, Struct, THIS, Trait, TraitFunc, TraitImpl, VALUE,
};
pub use name::{Ident, Name};
pub use ty::{TypeExpr, TypeExprKind};
