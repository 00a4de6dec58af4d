//! Global-scope resolution against the loaded indexes
#![allow(
    clippy::min_ident_chars,
    reason = "T is the matched value and D the definition kind"
)]

use crate::{ResolveAlternative, ResolveResult, SymbolMap, SymbolTarget};
use qss_ast::{Name, Script, TypeExpr, TypeExprKind};
use qss_diagnostics::{Message, Messenger};
use qss_index::{
    FieldDefinition, FuncDefinition, Index, Indices, StructDefinition, TraitDefinition,
    TraitImplDefinition, TypeResolver,
};
use qss_name::{BundleQualifiedName, QualifiedName};
use qss_span::{Location, Range};
use qss_types::{FunctionType, VariableType};
use std::cell::RefCell;

/// A definition together with its qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<D> {
    /// Qualified name of the definition
    pub name: QualifiedName,
    /// The definition
    pub definition: D,
}

trait Documented {
    fn location(&self) -> &Location;
    fn documentation(&self) -> Option<&str>;
}

macro_rules! documented {
    ($($definition:ty),*) => {
        $(
            impl Documented for $definition {
                fn location(&self) -> &Location {
                    &self.location
                }

                fn documentation(&self) -> Option<&str> {
                    self.documentation.as_deref()
                }
            }
        )*
    };
}

documented!(StructDefinition, FuncDefinition, TraitDefinition, FieldDefinition);

/// Resolves written names to definitions in any loaded bundle
///
/// Successful resolutions of written names are recorded in a [`SymbolMap`], which can be taken
/// out with [`Resolver::into_symbols`] once a script has been analyzed.
pub struct Resolver<'idx> {
    indices: &'idx Indices,
    symbols: RefCell<SymbolMap>,
}

impl<'idx> Resolver<'idx> {
    /// A resolver over the given store
    #[must_use]
    pub fn new(indices: &'idx Indices) -> Self {
        Self {
            indices,
            symbols: RefCell::new(SymbolMap::new()),
        }
    }

    /// The store being searched
    #[must_use]
    pub fn indices(&self) -> &'idx Indices {
        self.indices
    }

    /// The names resolved so far
    #[must_use]
    pub fn into_symbols(self) -> SymbolMap {
        self.symbols.into_inner()
    }

    /// Record that the name written at `range` refers to `target`
    pub fn bind(&self, range: Range, target: SymbolTarget) {
        self.symbols.borrow_mut().insert(range, target);
    }

    /// Find every definition `matcher` accepts, preferring packages visible to `script`
    ///
    /// First every imported package of every bundle is searched. If that finds nothing, every
    /// package is searched again, ignoring imports, so that the error can suggest what to import.
    /// Alternatives are ordered by bundle, then package.
    pub fn resolve_global_scope<T>(
        &self,
        script: &Script,
        mut matcher: impl FnMut(&Index) -> Vec<T>,
    ) -> ResolveResult<T> {
        let snapshot = self.indices.snapshot();
        let imported = script.imported_packages();
        let mut result = ResolveResult::default();

        for (bundle, index) in &snapshot {
            if !imported.contains(index.package()) {
                continue;
            }
            result
                .alternatives
                .extend(alternatives(bundle, index, matcher(index)));
        }

        if result.alternatives.is_empty() {
            for (bundle, index) in &snapshot {
                result
                    .non_imported
                    .extend(alternatives(bundle, index, matcher(index)));
            }
        }

        tracing::trace!(
            path = %script.path,
            alternatives = result.alternatives.len(),
            suggestions = result.non_imported.len(),
            "resolved in global scope"
        );
        result
    }

    /// Resolve the struct called `name`
    pub fn resolve_struct(&self, script: &Script, name: &Name) -> Messenger<Resolved<StructDefinition>> {
        let result = self.resolve_global_scope(script, |index| {
            matching(index, index.structs().iter(), name)
        });
        self.report(result, name.range, &format!("struct {name}"))
    }

    /// Resolve the trait called `name`
    pub fn resolve_trait(&self, script: &Script, name: &Name) -> Messenger<Resolved<TraitDefinition>> {
        let result = self.resolve_global_scope(script, |index| {
            matching(index, index.traits().iter(), name)
        });
        self.report(result, name.range, &format!("trait {name}"))
    }

    /// Resolve the function called `name`, including functions declared by traits
    ///
    /// `noun` says what was being searched for in error messages, e.g. `func` or `name`.
    pub fn resolve_func(
        &self,
        script: &Script,
        name: &Name,
        noun: &str,
    ) -> Messenger<Resolved<FuncDefinition>> {
        let result = self.resolve_global_scope(script, |index| {
            let mut found = matching(index, index.funcs().iter(), name);
            for definition in index.traits().values() {
                found.extend(matching(index, definition.funcs.iter(), name));
            }
            found
        });
        self.report(result, name.range, &format!("{noun} {name}"))
    }

    /// Resolve the field `field` of the struct `struct_name`
    pub fn resolve_struct_field(
        &self,
        script: &Script,
        struct_name: &QualifiedName,
        field: &Name,
    ) -> Messenger<Resolved<FieldDefinition>> {
        let result = self.resolve_global_scope(script, |index| {
            if Some(index.package()) != struct_name.trim_last().as_ref() {
                return Vec::new();
            }
            let Some(definition) = index.structs().get(struct_name.last()) else {
                return Vec::new();
            };
            definition
                .fields
                .iter()
                .filter(|(local, _)| field.is_local(local))
                .map(|(local, field_definition)| Resolved {
                    name: struct_name.append(local.as_str()),
                    definition: field_definition.clone(),
                })
                .collect()
        });
        self.report(
            result,
            field.range,
            &format!("field {field} belonging to struct {struct_name}"),
        )
    }

    /// Resolve the implementation of `trait_name` for `ty`, reporting errors at `range`
    pub fn resolve_trait_impl(
        &self,
        script: &Script,
        range: Range,
        ty: &VariableType,
        trait_name: &QualifiedName,
    ) -> Messenger<TraitImplDefinition> {
        let result = self.resolve_global_scope(script, |index| {
            index.trait_impl(trait_name, ty).cloned().into_iter().collect()
        });
        result
            .report(range, &format!("impl of {trait_name} for {ty}"), |alternative| {
                package_list(&alternative.imports)
            })
            .map(|alternative| alternative.value)
    }

    /// All alternatives a type expression could denote, before `This` substitution
    pub fn type_alternatives(&self, script: &Script, ty: &TypeExpr) -> ResolveResult<VariableType> {
        match &ty.kind {
            TypeExprKind::Primitive(primitive) => ResolveResult::resolved((*primitive).into()),
            TypeExprKind::This => ResolveResult::resolved(VariableType::This),
            TypeExprKind::Named(name) => {
                let result = self.resolve_global_scope(script, |index| {
                    let mut found: Vec<(VariableType, SymbolTarget)> = Vec::new();
                    for (local, definition) in index.structs() {
                        let qualified = index.qualify(local);
                        if name.matches(&qualified) {
                            found.push((
                                VariableType::Struct(qualified.clone()),
                                target(qualified, definition),
                            ));
                        }
                    }
                    for (local, definition) in index.traits() {
                        let qualified = index.qualify(local);
                        if name.matches(&qualified) {
                            found.push((
                                VariableType::Trait(qualified.clone()),
                                target(qualified, definition),
                            ));
                        }
                    }
                    found
                });
                if let Some(single) = result.single() {
                    self.bind(name.range, single.value.1.clone());
                }
                result.map(|(found, _)| found)
            }
            TypeExprKind::Maybe(inner) => self.type_alternatives(script, inner).map(VariableType::maybe),
            TypeExprKind::List(element) => {
                self.type_alternatives(script, element).map(VariableType::list)
            }
            TypeExprKind::Map { key, value } => self
                .type_alternatives(script, key)
                .product(self.type_alternatives(script, value), VariableType::map),
            TypeExprKind::Func {
                purity,
                params,
                return_type,
            } => {
                let mut combined = ResolveResult::resolved(Vec::new());
                for param in params {
                    combined = combined.product(
                        self.type_alternatives(script, param),
                        |mut collected: Vec<VariableType>, next| {
                            collected.push(next);
                            collected
                        },
                    );
                }
                let returned = return_type.as_ref().map_or_else(
                    || ResolveResult::resolved(VariableType::VOID),
                    |return_type| self.type_alternatives(script, return_type),
                );
                combined.product(returned, |collected, returned_type| {
                    FunctionType::new(collected, returned_type)
                        .with_purity(*purity)
                        .into()
                })
            }
        }
    }

    fn report<D: Documented>(
        &self,
        result: ResolveResult<Resolved<D>>,
        range: Range,
        subject: &str,
    ) -> Messenger<Resolved<D>> {
        result
            .report(range, subject, |alternative| alternative.value.name.to_string())
            .map(|alternative| {
                self.bind(range, target(alternative.value.name.clone(), &alternative.value.definition));
                alternative.value
            })
    }
}

impl TypeResolver for Resolver<'_> {
    fn resolve_type(
        &self,
        script: &Script,
        this_type: Option<&VariableType>,
        what: &str,
        ty: &TypeExpr,
    ) -> Messenger<VariableType> {
        let result = self.type_alternatives(script, ty);
        match result.alternatives.len() {
            0 => Messenger::fail(vec![Message::error(
                ty.range,
                format!("Could not resolve type of {what}{}", result.import_suggestions()),
            )]),
            1 => match result.alternatives.into_iter().next() {
                Some(single) => resolve_type_parameters(ty.range, &single.value, this_type),
                None => Messenger::fail(Vec::new()),
            },
            _ => {
                let possibilities: Vec<String> = result
                    .alternatives
                    .iter()
                    .map(|alternative| alternative.value.to_string())
                    .collect();
                Messenger::fail(vec![Message::error(
                    ty.range,
                    format!(
                        "Type of {what} was ambiguous, possibilities were: {}",
                        possibilities.join(", ")
                    ),
                )])
            }
        }
    }

    fn resolve_trait_name(&self, script: &Script, name: &Name) -> Messenger<QualifiedName> {
        self.resolve_trait(script, name).map(|resolved| resolved.name)
    }
}

/// Substitute `this_type` for every `This` in `ty`
///
/// Outside traits and impl blocks (`this_type` is `None`) a `This` is an error and becomes
/// unknown.
pub fn resolve_type_parameters(
    range: Range,
    ty: &VariableType,
    this_type: Option<&VariableType>,
) -> Messenger<VariableType> {
    if !ty.mentions_this() {
        return Messenger::success(ty.clone());
    }
    match this_type {
        Some(this_type) => Messenger::success(ty.replace_this(this_type)),
        None => Messenger::success_with(
            ty.replace_this(&VariableType::UNKNOWN),
            vec![Message::error(
                range,
                "'This' type is not allowed outside traits and impl blocks",
            )],
        ),
    }
}

fn alternatives<T>(
    bundle: &str,
    index: &Index,
    values: Vec<T>,
) -> impl Iterator<Item = ResolveAlternative<T>> {
    let imports = vec![BundleQualifiedName::new(bundle, index.package().clone())];
    values.into_iter().map(move |value| ResolveAlternative {
        value,
        imports: imports.clone(),
    })
}

fn matching<'def, D: Clone + 'def>(
    index: &Index,
    definitions: impl Iterator<Item = (&'def String, &'def D)>,
    name: &Name,
) -> Vec<Resolved<D>> {
    definitions
        .filter_map(|(local, definition)| {
            let qualified = index.qualify(local);
            name.matches(&qualified).then(|| Resolved {
                name: qualified,
                definition: definition.clone(),
            })
        })
        .collect()
}

fn target<D: Documented>(name: QualifiedName, definition: &D) -> SymbolTarget {
    SymbolTarget {
        name,
        location: definition.location().clone(),
        documentation: definition.documentation().map(str::to_owned),
    }
}

fn package_list(imports: &[BundleQualifiedName]) -> String {
    let packages: Vec<String> = imports.iter().map(|import| import.name.to_string()).collect();
    packages.join(", ")
}
