//! Type expressions as written in source

use crate::Name;
use qss_span::Range;
use qss_types::{Primitive, Purity};

/// A written type, resolved to a `VariableType` by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    /// The shape of the type
    pub kind: TypeExprKind,
    /// Where it was written
    pub range: Range,
}

/// The shape of a [`TypeExpr`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExprKind {
    /// A built-in type such as `Int`
    Primitive(Primitive),
    /// A struct or trait, resolved by name
    Named(Name),
    /// `This` inside a trait or impl block
    This,
    /// `T?`
    Maybe(Box<TypeExpr>),
    /// `[T]`
    List(Box<TypeExpr>),
    /// `{K => V}`
    Map {
        /// Key type
        key: Box<TypeExpr>,
        /// Value type
        value: Box<TypeExpr>,
    },
    /// A function type such as `PureFunc(Int) -> Bool`
    Func {
        /// Declared purity
        purity: Purity,
        /// Parameter types
        params: Vec<TypeExpr>,
        /// Return type, if any
        return_type: Option<Box<TypeExpr>>,
    },
}

impl TypeExpr {
    /// Create a type expression
    pub fn new(kind: TypeExprKind, range: Range) -> Self {
        Self { kind, range }
    }

    /// A primitive type
    pub fn primitive(primitive: Primitive, range: Range) -> Self {
        Self::new(TypeExprKind::Primitive(primitive), range)
    }

    /// A named struct or trait type
    pub fn named(name: Name) -> Self {
        let range = name.range;
        Self::new(TypeExprKind::Named(name), range)
    }

    /// `inner?`
    pub fn maybe(inner: Self, range: Range) -> Self {
        Self::new(TypeExprKind::Maybe(Box::new(inner)), range)
    }

    /// `[element]`
    pub fn list(element: Self, range: Range) -> Self {
        Self::new(TypeExprKind::List(Box::new(element)), range)
    }

    /// `{key => value}`
    pub fn map(key: Self, value: Self, range: Range) -> Self {
        Self::new(
            TypeExprKind::Map {
                key: Box::new(key),
                value: Box::new(value),
            },
            range,
        )
    }
}
