//! Checks on top-level items that need the full index

use qss_ast::{FuncHook, Script, SetHook, Signature, TraitImpl};
use qss_diagnostics::Message;
use qss_index::{TypeResolver as _, signature_type};
use qss_resolve::Resolver;
use qss_types::VariableType;

/// Check hook signatures, `this` parameters and trait impls of `script`
pub fn validate_items(resolver: &Resolver<'_>, script: &Script) -> Vec<Message> {
    let mut messages = Vec::new();
    for hook in &script.hooks {
        check_hook(resolver, script, hook, &mut messages);
    }
    for hook in &script.set_hooks {
        check_set_hook(resolver, script, hook, &mut messages);
    }
    for hook in &script.new_hooks {
        resolver
            .resolve_struct(script, &hook.struct_name)
            .report_into(&mut messages);
    }
    for func in &script.funcs {
        check_this_param(&func.signature, &mut messages);
    }
    for item in &script.trait_impls {
        for func in &item.funcs {
            check_this_param(&func.signature, &mut messages);
        }
        check_trait_impl(resolver, script, item, &mut messages);
    }
    messages
}

/// A hook must have exactly the signature of the function it hooks into
fn check_hook(resolver: &Resolver<'_>, script: &Script, hook: &FuncHook, messages: &mut Vec<Message>) {
    let Some(target) = resolver
        .resolve_func(script, &hook.target, "func")
        .report_into(messages)
    else {
        return;
    };
    let Some(expected) = target.definition.ty else {
        return;
    };

    // Unresolved parameter types were already reported by the index.
    let mut ignored = Vec::new();
    let actual = signature_type(script, &hook.signature, None, resolver, &mut ignored);
    if actual != expected {
        messages.push(
            Message::error(
                hook.target.range,
                format!("Hook signature {actual} did not match target function signature {expected}"),
            )
            .with_related(target.definition.location, "Original function was defined here"),
        );
    }
}

/// A set hook's written type must be exactly the type of the field it hooks into
fn check_set_hook(resolver: &Resolver<'_>, script: &Script, hook: &SetHook, messages: &mut Vec<Message>) {
    let Some(target) = resolver
        .resolve_struct(script, &hook.struct_name)
        .report_into(messages)
    else {
        return;
    };
    let actual = resolver
        .resolve_type(script, None, &hook.field.to_string(), &hook.field_type)
        .report_into(messages);
    let Some(field) = resolver
        .resolve_struct_field(script, &target.name, &hook.field)
        .report_into(messages)
    else {
        return;
    };
    let Some(actual) = actual else {
        return;
    };

    let expected = field.definition.ty;
    if !expected.is_unknown() && actual != expected {
        messages.push(
            Message::error(
                hook.field_type.range,
                format!("Hook was of incorrect type; expected {expected}, got {actual}"),
            )
            .with_related(field.definition.location, "Original field was defined here"),
        );
    }
}

fn check_this_param(signature: &Signature, messages: &mut Vec<Message>) {
    for param in signature.params.iter().skip(1) {
        if param.name.name == "this" {
            messages.push(Message::error(
                param.name.range,
                "Only the first function parameter may be named 'this'",
            ));
        }
    }
}

/// Every trait function implemented with the right type, and nothing else
fn check_trait_impl(resolver: &Resolver<'_>, script: &Script, item: &TraitImpl, messages: &mut Vec<Message>) {
    let Some(resolved) = resolver
        .resolve_trait(script, &item.trait_name)
        .report_into(messages)
    else {
        return;
    };
    let mut ignored = Vec::new();
    let this_type = resolver
        .resolve_type(script, None, "impl type", &item.for_type)
        .report_into(&mut ignored)
        .unwrap_or(VariableType::UNKNOWN);

    let trait_funcs = &resolved.definition.funcs;
    for (name, definition) in trait_funcs {
        let Some(implementation) = item.funcs.iter().find(|func| &func.name.name == name) else {
            messages.push(
                Message::error(
                    item.trait_name.range,
                    format!("Trait implementation did not implement function {name}"),
                )
                .with_related(definition.location.clone(), "Original function was defined here"),
            );
            continue;
        };
        let Some(declared) = &definition.ty else {
            continue;
        };

        let expected = VariableType::from(declared.clone()).replace_this(&this_type);
        let actual = VariableType::from(signature_type(
            script,
            &implementation.signature,
            Some(&this_type),
            resolver,
            &mut ignored,
        ));
        if actual != expected {
            messages.push(
                Message::error(
                    implementation.name.range,
                    format!(
                        "Trait function implementation was of incorrect type; expected {expected}, got {actual}"
                    ),
                )
                .with_related(definition.location.clone(), "Original function was defined here"),
            );
        }
    }

    for func in &item.funcs {
        if !trait_funcs.contains_key(&func.name.name) {
            messages.push(
                Message::error(
                    func.name.range,
                    format!("Unknown trait function {}", func.name.name),
                )
                .with_related(resolved.definition.location.clone(), "Trait was defined here"),
            );
        }
    }
}
