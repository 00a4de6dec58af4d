//! The analyzed function, with its signature resolved

use qss_ast::{Body, HookTime, Ident, Script, Signature};
use qss_diagnostics::{Message, Messenger};
use qss_index::TypeResolver;
use qss_span::Range;
use qss_types::{Purity, VariableType};

/// What kind of body is analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// A function or trait function implementation
    Func,
    /// A `before` or `after` hook
    Hook(HookTime),
}

/// One function body ready for dataflow analysis
#[derive(Debug, Clone)]
pub struct FlowFunction<'body> {
    /// Function or hook
    pub kind: FunctionKind,
    /// Written parameters with their resolved types, duplicates included
    pub params: Vec<(&'body Ident, VariableType)>,
    /// Range and resolved type of the declared return type
    pub return_type: Option<(Range, VariableType)>,
    /// Declared purity
    pub purity: Purity,
    /// What `This` stands for inside the body
    pub this_type: Option<VariableType>,
    /// The statements
    pub body: &'body Body,
}

impl<'body> FlowFunction<'body> {
    /// Resolve `signature` and pair it with `body`
    ///
    /// Types that fail to resolve become unknown; the resolution messages are returned alongside.
    pub fn resolve(
        kind: FunctionKind,
        signature: &'body Signature,
        body: &'body Body,
        this_type: Option<&VariableType>,
        script: &Script,
        resolver: &dyn TypeResolver,
    ) -> Messenger<Self> {
        let mut messages: Vec<Message> = Vec::new();
        let params = signature
            .params
            .iter()
            .map(|param| {
                let ty = resolver
                    .resolve_type(script, this_type, &param.name.name, &param.ty)
                    .report_into(&mut messages)
                    .unwrap_or(VariableType::UNKNOWN);
                (&param.name, ty)
            })
            .collect();
        let return_type = signature.return_type.as_ref().map(|ty| {
            let resolved = resolver
                .resolve_type(script, this_type, "result", ty)
                .report_into(&mut messages)
                .unwrap_or(VariableType::UNKNOWN);
            (ty.range, resolved)
        });
        Messenger::success_with(
            Self {
                kind,
                params,
                return_type,
                purity: signature.purity,
                this_type: this_type.cloned(),
                body,
            },
            messages,
        )
    }

    /// Whether this is a `before` hook
    #[must_use]
    pub fn is_before_hook(&self) -> bool {
        self.kind == FunctionKind::Hook(HookTime::Before)
    }

    /// The declared return type, unless there is none or it is void
    #[must_use]
    pub fn returned_type(&self) -> Option<&VariableType> {
        self.return_type
            .as_ref()
            .map(|(_, ty)| ty)
            .filter(|ty| !ty.is_void())
    }
}
