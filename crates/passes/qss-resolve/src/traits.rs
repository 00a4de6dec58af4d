//! Trait implementation checks

use crate::Resolver;
use qss_ast::Script;
use qss_diagnostics::Messenger;
use qss_name::QualifiedName;
use qss_span::Range;
use qss_types::{ImplLookup, VariableType};

/// Checks whether types implement traits, as seen from one script
///
/// Only implementations visible through the script's imports count. Another bundle may still
/// implement the trait at run time; this check only covers what can be seen now.
pub struct TraitChecker<'res> {
    resolver: &'res Resolver<'res>,
    script: &'res Script,
}

impl<'res> TraitChecker<'res> {
    /// A checker resolving implementations visible from `script`
    #[must_use]
    pub fn new(resolver: &'res Resolver<'res>, script: &'res Script) -> Self {
        Self { resolver, script }
    }

    /// Check that `ty` implements `trait_name`, reporting at `range` if it does not
    ///
    /// A value whose type is the trait itself, or is unknown, passes without a lookup.
    pub fn does_implement(
        &self,
        range: Range,
        ty: &VariableType,
        trait_name: &QualifiedName,
    ) -> Messenger<()> {
        if ty.is_unknown() || is_trait(ty, trait_name) {
            return Messenger::success(());
        }
        self.resolver
            .resolve_trait_impl(self.script, range, ty, trait_name)
            .map(|_| ())
    }
}

impl ImplLookup for TraitChecker<'_> {
    fn implements(&self, ty: &VariableType, trait_name: &QualifiedName) -> bool {
        if is_trait(ty, trait_name) {
            return true;
        }
        self.resolver
            .resolve_global_scope(self.script, |index| {
                index
                    .trait_impl(trait_name, ty)
                    .map(|definition| definition.location.clone())
                    .into_iter()
                    .collect()
            })
            .single()
            .is_some()
    }
}

fn is_trait(ty: &VariableType, trait_name: &QualifiedName) -> bool {
    matches!(ty, VariableType::Trait(name) if name == trait_name)
}
