//! Implicit downcasting between types

use crate::{Primitive, VariableType};
use qss_diagnostics::{Message, Messenger};
use qss_name::QualifiedName;
use qss_span::Range;

/// Answers whether a type implements a trait
///
/// Implemented by the resolver on top of the symbol index so that struct values can be passed
/// where a trait view of them is expected.
pub trait ImplLookup {
    /// Whether `ty` has a visible implementation of `trait_name`
    fn implements(&self, ty: &VariableType, trait_name: &QualifiedName) -> bool;
}

/// An [`ImplLookup`] that knows no implementations
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImpls;

impl ImplLookup for NoImpls {
    fn implements(&self, _ty: &VariableType, _trait_name: &QualifiedName) -> bool {
        false
    }
}

/// Decides whether a value of one type may be used where another is expected
pub struct CastChecker<'impls> {
    impls: &'impls dyn ImplLookup,
}

impl<'impls> CastChecker<'impls> {
    /// Create a checker backed by the given trait implementations
    pub fn new(impls: &'impls dyn ImplLookup) -> Self {
        Self { impls }
    }

    /// Check that an expression of type `source` may be used where `target` is expected
    ///
    /// Fails with an `Expected an expression of type ...` error at `range` otherwise. If either
    /// side is unknown the check passes silently, since an error was already reported for the
    /// expression that produced it.
    pub fn attempt_downcast(
        &self,
        range: Range,
        source: &VariableType,
        target: &VariableType,
    ) -> Messenger<()> {
        if self.can_downcast(source, target) {
            Messenger::success(())
        } else {
            Messenger::fail(vec![Message::error(
                range,
                format!("Expected an expression of type {target}, got {source}"),
            )])
        }
    }

    /// The structural rule behind [`Self::attempt_downcast`]
    #[must_use]
    pub fn can_downcast(&self, source: &VariableType, target: &VariableType) -> bool {
        match (source, target) {
            (VariableType::Primitive(Primitive::Unknown), _)
            | (_, VariableType::Primitive(Primitive::Unknown)) => true,

            (VariableType::Primitive(left), VariableType::Primitive(right)) => left == right,

            (VariableType::Maybe(left), VariableType::Maybe(right))
            | (VariableType::List(left), VariableType::List(right)) => {
                self.can_downcast(left, right)
            }

            (
                VariableType::Map {
                    key: left_key,
                    value: left_value,
                },
                VariableType::Map {
                    key: right_key,
                    value: right_value,
                },
            ) => self.can_downcast(left_key, right_key) && self.can_downcast(left_value, right_value),

            // Parameters are compared in the same direction as the whole function.
            (VariableType::Function(left), VariableType::Function(right)) => {
                left.params.len() == right.params.len()
                    && self.can_downcast(&left.return_type, &right.return_type)
                    && left
                        .params
                        .iter()
                        .zip(&right.params)
                        .all(|(left_param, right_param)| self.can_downcast(left_param, right_param))
            }

            (VariableType::Struct(left), VariableType::Struct(right))
            | (VariableType::Trait(left), VariableType::Trait(right)) => left == right,

            (VariableType::Struct(_), VariableType::Primitive(Primitive::AnyStruct))
            | (VariableType::This, VariableType::This) => true,

            (VariableType::Struct(_), VariableType::Trait(trait_name)) => {
                self.impls.implements(source, trait_name)
            }

            _ => false,
        }
    }
}
