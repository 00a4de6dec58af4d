//! The per-package index and its two build phases

use crate::TypeResolver;
use indexmap::IndexMap;
use indexmap::map::Entry;
use qss_ast::{FuncBody, Ident, Script, Signature};
use qss_diagnostics::Message;
use qss_name::QualifiedName;
use qss_span::Location;
use qss_types::{FunctionType, VariableType};
use serde::{Deserialize, Serialize};

/// How far an [`Index`] has been built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexPhase {
    /// Only names, documentation and locations are known
    #[default]
    Names,
    /// Field types, signatures and trait impls are resolved as well
    Full,
}

/// A struct field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Documentation comment
    pub documentation: Option<String>,
    /// Where the field is declared
    pub location: Location,
    /// Resolved type, [`VariableType::UNKNOWN`] if resolution failed
    pub ty: VariableType,
}

/// A struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDefinition {
    /// Documentation comment
    pub documentation: Option<String>,
    /// Where the struct is declared
    pub location: Location,
    /// Fields by name; empty until the full phase
    pub fields: IndexMap<String, FieldDefinition>,
}

/// A function, trait function or trait function implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDefinition {
    /// Documentation comment
    pub documentation: Option<String>,
    /// Where the function is declared
    pub location: Location,
    /// Resolved type; `None` until the full phase
    pub ty: Option<FunctionType>,
}

/// A trait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDefinition {
    /// Documentation comment
    pub documentation: Option<String>,
    /// Where the trait is declared
    pub location: Location,
    /// Declared functions by name; empty until the full phase
    pub funcs: IndexMap<String, FuncDefinition>,
}

/// `impl Trait for Type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitImplDefinition {
    /// The implemented trait
    pub trait_name: QualifiedName,
    /// The implementing type
    pub for_type: VariableType,
    /// Where the impl block is written
    pub location: Location,
    /// Implemented functions by name
    pub funcs: IndexMap<String, FuncDefinition>,
}

trait Located {
    fn location(&self) -> &Location;
}

impl Located for StructDefinition {
    fn location(&self) -> &Location {
        &self.location
    }
}

impl Located for FuncDefinition {
    fn location(&self) -> &Location {
        &self.location
    }
}

impl Located for TraitDefinition {
    fn location(&self) -> &Location {
        &self.location
    }
}

/// Everything one package defines
///
/// An index is built from the package's scripts in two phases. [`Index::add_names`] records
/// which names exist, so that every package's names are known before any type is resolved.
/// [`Index::add_types`] then resolves field types, signatures and trait impls against that name
/// universe. Adding a script is idempotent: definitions already recorded at the same location are
/// left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    package: QualifiedName,
    phase: IndexPhase,
    structs: IndexMap<String, StructDefinition>,
    funcs: IndexMap<String, FuncDefinition>,
    traits: IndexMap<String, TraitDefinition>,
    trait_impls: Vec<TraitImplDefinition>,
}

impl Index {
    /// An empty index for `package`
    #[must_use]
    pub fn new(package: QualifiedName) -> Self {
        Self {
            package,
            phase: IndexPhase::Names,
            structs: IndexMap::new(),
            funcs: IndexMap::new(),
            traits: IndexMap::new(),
            trait_impls: Vec::new(),
        }
    }

    /// The package this index describes
    #[must_use]
    pub fn package(&self) -> &QualifiedName {
        &self.package
    }

    /// How far the index has been built
    #[must_use]
    pub fn phase(&self) -> IndexPhase {
        self.phase
    }

    /// Structs by name
    #[must_use]
    pub fn structs(&self) -> &IndexMap<String, StructDefinition> {
        &self.structs
    }

    /// Functions by name
    #[must_use]
    pub fn funcs(&self) -> &IndexMap<String, FuncDefinition> {
        &self.funcs
    }

    /// Traits by name
    #[must_use]
    pub fn traits(&self) -> &IndexMap<String, TraitDefinition> {
        &self.traits
    }

    /// Trait implementations, in the order they were added
    #[must_use]
    pub fn trait_impls(&self) -> &[TraitImplDefinition] {
        &self.trait_impls
    }

    /// The implementation of `trait_name` for `for_type`, if this package has one
    #[must_use]
    pub fn trait_impl(
        &self,
        trait_name: &QualifiedName,
        for_type: &VariableType,
    ) -> Option<&TraitImplDefinition> {
        self.trait_impls
            .iter()
            .find(|definition| &definition.trait_name == trait_name && &definition.for_type == for_type)
    }

    /// The qualified name of a definition called `name` in this package
    #[must_use]
    pub fn qualify(&self, name: &str) -> QualifiedName {
        self.package.append(name)
    }

    /// Register the struct, function and trait names of `script`
    ///
    /// A name defined twice in the package keeps its first definition and reports the second.
    pub fn add_names(&mut self, script: &Script) -> Vec<Message> {
        let mut messages = Vec::new();
        for item in &script.structs {
            let definition = StructDefinition {
                documentation: item.documentation.clone(),
                location: Location::new(script.path.clone(), item.range),
                fields: IndexMap::new(),
            };
            register(&mut self.structs, "Struct", &item.name, definition, &mut messages);
        }
        for item in &script.funcs {
            let definition = FuncDefinition {
                documentation: item.documentation.clone(),
                location: Location::new(script.path.clone(), item.range),
                ty: None,
            };
            register(&mut self.funcs, "Func", &item.name, definition, &mut messages);
        }
        for item in &script.traits {
            let definition = TraitDefinition {
                documentation: item.documentation.clone(),
                location: Location::new(script.path.clone(), item.range),
                funcs: IndexMap::new(),
            };
            register(&mut self.traits, "Trait", &item.name, definition, &mut messages);
        }
        tracing::trace!(package = %self.package, path = %script.path, "indexed names");
        messages
    }

    /// Resolve the field types, signatures and trait impls of `script`
    ///
    /// Expects [`Index::add_names`] to have run for every loaded package. Unresolvable field types
    /// are recorded as unknown after reporting an error; indexing always carries on.
    pub fn add_types(&mut self, script: &Script, resolver: &dyn TypeResolver) -> Vec<Message> {
        let mut messages = Vec::new();
        self.phase = IndexPhase::Full;

        for item in &script.structs {
            let location = Location::new(script.path.clone(), item.range);
            let mut fields: IndexMap<String, FieldDefinition> = IndexMap::new();
            for field in &item.fields {
                if let Some(previous) = fields.get(&field.name.name) {
                    messages.push(
                        Message::error(
                            field.name.range,
                            format!("Field {} was already defined", field.name.name),
                        )
                        .with_related(previous.location.clone(), "Previously defined here"),
                    );
                    continue;
                }
                let ty = resolver
                    .resolve_type(script, None, &field.name.name, &field.ty)
                    .report_into(&mut messages)
                    .unwrap_or(VariableType::UNKNOWN);
                fields.insert(
                    field.name.name.clone(),
                    FieldDefinition {
                        documentation: field.documentation.clone(),
                        location: Location::new(script.path.clone(), field.range),
                        ty,
                    },
                );
            }
            let definition = self
                .structs
                .entry(item.name.name.clone())
                .or_insert_with(|| StructDefinition {
                    documentation: item.documentation.clone(),
                    location: location.clone(),
                    fields: IndexMap::new(),
                });
            if definition.location == location {
                definition.fields = fields;
            }
        }

        for item in &script.funcs {
            let location = Location::new(script.path.clone(), item.range);
            let mut ty = signature_type(script, &item.signature, None, resolver, &mut messages);
            ty.is_native = matches!(item.body, FuncBody::Native);
            let definition = self
                .funcs
                .entry(item.name.name.clone())
                .or_insert_with(|| FuncDefinition {
                    documentation: item.documentation.clone(),
                    location: location.clone(),
                    ty: None,
                });
            if definition.location == location {
                definition.ty = Some(ty);
            }
        }

        for item in &script.traits {
            let trait_name = self.qualify(&item.name.name);
            let location = Location::new(script.path.clone(), item.range);
            let mut funcs = IndexMap::new();
            for func in &item.funcs {
                let ty = signature_type(
                    script,
                    &func.signature,
                    Some(&VariableType::This),
                    resolver,
                    &mut messages,
                )
                .in_trait(trait_name.clone());
                let definition = FuncDefinition {
                    documentation: func.documentation.clone(),
                    location: Location::new(script.path.clone(), func.range),
                    ty: Some(ty),
                };
                register_trait_func(&mut funcs, &func.name, definition, &mut messages);
            }
            let definition = self
                .traits
                .entry(item.name.name.clone())
                .or_insert_with(|| TraitDefinition {
                    documentation: item.documentation.clone(),
                    location: location.clone(),
                    funcs: IndexMap::new(),
                });
            if definition.location == location {
                definition.funcs = funcs;
            }
        }

        for item in &script.trait_impls {
            let trait_name = resolver
                .resolve_trait_name(script, &item.trait_name)
                .report_into(&mut messages);
            let for_type = resolver
                .resolve_type(script, None, "impl type", &item.for_type)
                .report_into(&mut messages);
            let this_type = for_type.clone().unwrap_or(VariableType::UNKNOWN);

            let mut funcs = IndexMap::new();
            for func in &item.funcs {
                let mut ty =
                    signature_type(script, &func.signature, Some(&this_type), resolver, &mut messages);
                ty.is_native = matches!(func.body, FuncBody::Native);
                let definition = FuncDefinition {
                    documentation: func.documentation.clone(),
                    location: Location::new(script.path.clone(), func.range),
                    ty: Some(ty),
                };
                register_trait_func(&mut funcs, &func.name, definition, &mut messages);
            }

            let (Some(trait_name), Some(for_type)) = (trait_name, for_type) else {
                continue;
            };
            let location = Location::new(script.path.clone(), item.range);
            if let Some(previous) = self.trait_impl(&trait_name, &for_type) {
                if previous.location != location {
                    messages.push(
                        Message::error(
                            item.for_type.range,
                            format!("Trait {trait_name} was already implemented for {for_type}"),
                        )
                        .with_related(previous.location.clone(), "Previously implemented here"),
                    );
                }
                continue;
            }
            self.trait_impls.push(TraitImplDefinition {
                trait_name,
                for_type,
                location,
                funcs,
            });
        }

        tracing::trace!(package = %self.package, path = %script.path, "indexed types");
        messages
    }
}

/// Resolve a signature into a function type
///
/// `this_type` is what `This` stands for: `This` itself inside a trait, the implementing type
/// inside an impl block and `None` elsewhere. Duplicate parameters are reported and left out.
/// A signature is receiver-style if it says so or if its first parameter is named `this`.
pub fn signature_type(
    script: &Script,
    signature: &Signature,
    this_type: Option<&VariableType>,
    resolver: &dyn TypeResolver,
    messages: &mut Vec<Message>,
) -> FunctionType {
    let mut seen: Vec<&Ident> = Vec::new();
    let mut params = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        if let Some(previous) = seen.iter().find(|name| name.name == param.name.name) {
            messages.push(
                Message::error(
                    param.name.range,
                    format!("Parameter {} was already defined", param.name.name),
                )
                .with_related(
                    Location::new(script.path.clone(), previous.range),
                    "Previously defined here",
                ),
            );
            continue;
        }
        seen.push(&param.name);
        params.push(
            resolver
                .resolve_type(script, this_type, &param.name.name, &param.ty)
                .report_into(messages)
                .unwrap_or(VariableType::UNKNOWN),
        );
    }

    let return_type = signature.return_type.as_ref().map_or(VariableType::VOID, |ty| {
        resolver
            .resolve_type(script, this_type, "result", ty)
            .report_into(messages)
            .unwrap_or(VariableType::UNKNOWN)
    });

    let mut function = FunctionType::new(params, return_type).with_purity(signature.purity);
    function.receiver_style = signature.receiver_style
        || signature
            .params
            .first()
            .is_some_and(|param| param.name.name == "this");
    function
}

fn register<Definition: Located>(
    definitions: &mut IndexMap<String, Definition>,
    kind: &str,
    name: &Ident,
    definition: Definition,
    messages: &mut Vec<Message>,
) {
    match definitions.entry(name.name.clone()) {
        Entry::Occupied(existing) => {
            if existing.get().location() != definition.location() {
                messages.push(
                    Message::error(name.range, format!("{kind} {} was already defined", name.name))
                        .with_related(existing.get().location().clone(), "Previously defined here"),
                );
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(definition);
        }
    }
}

fn register_trait_func(
    funcs: &mut IndexMap<String, FuncDefinition>,
    name: &Ident,
    definition: FuncDefinition,
    messages: &mut Vec<Message>,
) {
    match funcs.entry(name.name.clone()) {
        Entry::Occupied(existing) => messages.push(
            Message::error(name.range, "A trait function with this name was already defined")
                .with_related(existing.get().location.clone(), "Previously defined here"),
        ),
        Entry::Vacant(slot) => {
            slot.insert(definition);
        }
    }
}
