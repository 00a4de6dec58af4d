use qss_ast::{Name, Script, TypeExpr};
use qss_diagnostics::Messenger;
use qss_name::QualifiedName;
use qss_types::VariableType;

/// Resolves written types while the full index phase runs
///
/// Implemented by the global-scope resolver, which needs the name phase of every package to be
/// complete.
pub trait TypeResolver {
    /// Resolve `ty`, written in `script`, describing `what` in error messages
    ///
    /// `this_type` is what `This` stands for at this point, or `None` outside traits and impl
    /// blocks.
    fn resolve_type(
        &self,
        script: &Script,
        this_type: Option<&VariableType>,
        what: &str,
        ty: &TypeExpr,
    ) -> Messenger<VariableType>;

    /// Resolve the name of a trait
    fn resolve_trait_name(&self, script: &Script, name: &Name) -> Messenger<QualifiedName>;
}
