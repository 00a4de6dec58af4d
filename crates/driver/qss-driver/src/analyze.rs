//! Whole-script analysis against a built index

use crate::validate::validate_items;
use indexmap::IndexSet;
use qss_ast::{Body, FuncBody, HookTime, Script, Signature};
use qss_diagnostics::Message;
use qss_flow::{ExprTypes, FlowFunction, FunctionKind, VariableTracker};
use qss_index::{Indices, TypeResolver as _};
use qss_resolve::{Resolver, SymbolMap};
use qss_span::Range;
use qss_types::VariableType;

/// Deduced expression types of one function or hook body
#[derive(Debug)]
pub struct BodyTypes {
    /// Function name, or the hooked function's name for hooks
    pub name: String,
    /// Range of the whole item
    pub range: Range,
    /// Deduced type of every evaluated expression
    pub types: ExprTypes,
}

/// Everything learnt about one script
#[derive(Debug)]
pub struct Analysis {
    /// Diagnostics without duplicates, in the order they were found
    pub messages: Vec<Message>,
    /// Per-body type tables, for bodies that were analyzed
    pub bodies: Vec<BodyTypes>,
    /// Resolved names, for hover and jump-to-definition
    pub symbols: SymbolMap,
}

/// One body waiting to be tracked
struct Pending<'script> {
    name: String,
    range: Range,
    kind: FunctionKind,
    signature: &'script Signature,
    body: &'script Body,
    this_type: Option<VariableType>,
    /// Whether validation already reported problems with the signature's types
    validated_signature: bool,
}

/// Validate the items of `script` and track every function, trait function and hook body
///
/// The packages `script` refers to must already be fully indexed in `indices`. A body on which
/// the analyzer hits an internal error is logged and left out of the result.
pub fn analyze_script(indices: &Indices, script: &Script) -> Analysis {
    let resolver = Resolver::new(indices);
    let mut messages = validate_items(&resolver, script);
    let mut bodies = Vec::new();

    {
        let tracker = VariableTracker::new(&resolver, script);
        for pending in pending_bodies(&resolver, script) {
            let resolved = FlowFunction::resolve(
                pending.kind,
                pending.signature,
                pending.body,
                pending.this_type.as_ref(),
                script,
                &resolver,
            );
            let function = if pending.validated_signature {
                resolved.into_parts().0
            } else {
                resolved.report_into(&mut messages)
            };
            let Some(function) = function else {
                continue;
            };
            match tracker.track(&function) {
                Ok(outcome) => {
                    messages.extend(outcome.messages);
                    bodies.push(BodyTypes {
                        name: pending.name,
                        range: pending.range,
                        types: outcome.types,
                    });
                }
                Err(error) => tracing::error!(
                    path = %script.path,
                    function = %pending.name,
                    %error,
                    "skipping function after internal error"
                ),
            }
        }
    }

    let messages = deduplicate(messages);
    tracing::debug!(path = %script.path, messages = messages.len(), bodies = bodies.len(), "analyzed script");
    Analysis {
        messages,
        bodies,
        symbols: resolver.into_symbols(),
    }
}

fn pending_bodies<'script>(resolver: &Resolver<'_>, script: &'script Script) -> Vec<Pending<'script>> {
    let mut pending = Vec::new();
    for func in &script.funcs {
        if let FuncBody::Block(body) = &func.body {
            pending.push(Pending {
                name: func.name.name.clone(),
                range: func.range,
                kind: FunctionKind::Func,
                signature: &func.signature,
                body,
                this_type: None,
                validated_signature: false,
            });
        }
    }

    for item in &script.trait_impls {
        // Errors in the impl type were reported while indexing.
        let mut ignored = Vec::new();
        let this_type = resolver
            .resolve_type(script, None, "impl type", &item.for_type)
            .report_into(&mut ignored)
            .unwrap_or(VariableType::UNKNOWN);
        for func in &item.funcs {
            if let FuncBody::Block(body) = &func.body {
                pending.push(Pending {
                    name: func.name.name.clone(),
                    range: func.range,
                    kind: FunctionKind::Func,
                    signature: &func.signature,
                    body,
                    this_type: Some(this_type.clone()),
                    validated_signature: false,
                });
            }
        }
    }

    for hook in &script.hooks {
        pending.push(Pending {
            name: hook.target.to_string(),
            range: hook.range,
            kind: FunctionKind::Hook(hook.time),
            signature: &hook.signature,
            body: &hook.body,
            this_type: None,
            validated_signature: false,
        });
    }

    for hook in &script.set_hooks {
        pending.push(Pending {
            name: format!("{}.{}", hook.struct_name, hook.field),
            range: hook.range,
            kind: FunctionKind::Hook(hook.time),
            signature: &hook.signature,
            body: &hook.body,
            this_type: None,
            validated_signature: true,
        });
    }

    for hook in &script.new_hooks {
        pending.push(Pending {
            name: hook.struct_name.to_string(),
            range: hook.range,
            kind: FunctionKind::Hook(HookTime::After),
            signature: &hook.signature,
            body: &hook.body,
            this_type: None,
            validated_signature: true,
        });
    }
    pending
}

/// Drop repeated messages, keeping the first occurrence
pub fn deduplicate(messages: impl IntoIterator<Item = Message>) -> Vec<Message> {
    messages.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}
