//! Scripts and the items declared in them

use crate::{Body, Ident, Name, TypeExpr};
use qss_name::{QualifiedName, ScriptPath};
use qss_span::Range;
use qss_types::Purity;

/// Name of the receiver parameter
pub const THIS: &str = "this";

/// Name of the assigned value inside set hooks
pub const VALUE: &str = "value";

/// One parsed script file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Path relative to the bundle root
    pub path: ScriptPath,
    /// The package the script belongs to
    pub package: QualifiedName,
    /// `import` declarations
    pub imports: Vec<Import>,
    /// Struct declarations
    pub structs: Vec<Struct>,
    /// Function declarations
    pub funcs: Vec<Func>,
    /// Trait declarations
    pub traits: Vec<Trait>,
    /// `impl Trait for Type` blocks
    pub trait_impls: Vec<TraitImpl>,
    /// `before`/`after` hooks
    pub hooks: Vec<FuncHook>,
    /// `before set`/`after set` hooks
    pub set_hooks: Vec<SetHook>,
    /// `after new` hooks
    pub new_hooks: Vec<NewStructHook>,
}

impl Script {
    /// An empty script in `package`
    #[must_use]
    pub fn new(path: ScriptPath, package: QualifiedName) -> Self {
        Self {
            path,
            package,
            imports: Vec::new(),
            structs: Vec::new(),
            funcs: Vec::new(),
            traits: Vec::new(),
            trait_impls: Vec::new(),
            hooks: Vec::new(),
            set_hooks: Vec::new(),
            new_hooks: Vec::new(),
        }
    }

    /// The packages whose names are visible: the script's own package, then its imports
    #[must_use]
    pub fn imported_packages(&self) -> Vec<QualifiedName> {
        let mut packages = vec![self.package.clone()];
        for import in &self.imports {
            if !packages.contains(&import.package) {
                packages.push(import.package.clone());
            }
        }
        packages
    }
}

/// `import a::b;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The imported package
    pub package: QualifiedName,
    /// Source location
    pub range: Range,
}

/// `struct S { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    /// Struct name
    pub name: Ident,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<Field>,
    /// Source location
    pub range: Range,
}

/// `name: Type` inside a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name
    pub name: Ident,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Declared type
    pub ty: TypeExpr,
    /// Source location
    pub range: Range,
}

/// `name: Type` in a parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name
    pub name: Ident,
    /// Declared type
    pub ty: TypeExpr,
}

/// Purity, parameters and return type of a function, trait function or hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Declared purity
    pub purity: Purity,
    /// Whether the first parameter is a receiver
    pub receiver_style: bool,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Return type, if any
    pub return_type: Option<TypeExpr>,
}

/// A function declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    /// Function name
    pub name: Ident,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Signature
    pub signature: Signature,
    /// Body
    pub body: FuncBody,
    /// Source location
    pub range: Range,
}

/// The implementation of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncBody {
    /// Provided by the runtime
    Native,
    /// Written in QSS
    Block(Body),
}

/// When a hook runs relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookTime {
    /// Before the target runs; may not return
    Before,
    /// After the target runs; may read and replace `result`
    After,
}

/// `before target(...) { ... }` or `after target(...) { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncHook {
    /// When the hook runs
    pub time: HookTime,
    /// The hooked function
    pub target: Name,
    /// Must match the target's signature
    pub signature: Signature,
    /// Body
    pub body: Body,
    /// Source location
    pub range: Range,
}

/// `before set S.field: Type { ... }` or `after set S.field: Type { ... }`
///
/// The body is pure and sees the struct as `this` and the assigned value as `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetHook {
    /// When the hook runs
    pub time: HookTime,
    /// The struct owning the field
    pub struct_name: Name,
    /// The hooked field
    pub field: Name,
    /// Must match the field's type
    pub field_type: TypeExpr,
    /// Implicit `(this: S, value: Type)`, built by [`SetHook::new`]
    pub signature: Signature,
    /// Body
    pub body: Body,
    /// Source location
    pub range: Range,
}

impl SetHook {
    /// A set hook, with `this` and `value` parameters written at the field name
    #[must_use]
    pub fn new(
        time: HookTime,
        struct_name: Name,
        field: Name,
        field_type: TypeExpr,
        body: Body,
        range: Range,
    ) -> Self {
        let signature = Signature {
            purity: Purity::Pure,
            receiver_style: false,
            params: vec![
                Param {
                    name: Ident::new(THIS, field.range),
                    ty: TypeExpr::named(struct_name.clone()),
                },
                Param {
                    name: Ident::new(VALUE, field.range),
                    ty: field_type.clone(),
                },
            ],
            return_type: None,
        };
        Self {
            time,
            struct_name,
            field,
            field_type,
            signature,
            body,
            range,
        }
    }
}

/// `after new S { ... }`, run on every newly created `S`
///
/// The body is pure and may replace the created value through `result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStructHook {
    /// The created struct
    pub struct_name: Name,
    /// Implicit `() -> S`, built by [`NewStructHook::new`]
    pub signature: Signature,
    /// Body
    pub body: Body,
    /// Source location
    pub range: Range,
}

impl NewStructHook {
    /// A new-struct hook returning the struct
    #[must_use]
    pub fn new(struct_name: Name, body: Body, range: Range) -> Self {
        let signature = Signature {
            purity: Purity::Pure,
            receiver_style: false,
            params: Vec::new(),
            return_type: Some(TypeExpr::named(struct_name.clone())),
        };
        Self {
            struct_name,
            signature,
            body,
            range,
        }
    }
}

/// `trait T { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    /// Trait name
    pub name: Ident,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Declared functions
    pub funcs: Vec<TraitFunc>,
    /// Source location
    pub range: Range,
}

/// A function signature declared by a trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitFunc {
    /// Function name
    pub name: Ident,
    /// Documentation comment
    pub documentation: Option<String>,
    /// Signature, may mention `This`
    pub signature: Signature,
    /// Source location
    pub range: Range,
}

/// `impl Trait for Type { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitImpl {
    /// The implemented trait
    pub trait_name: Name,
    /// The implementing type
    pub for_type: TypeExpr,
    /// Function implementations
    pub funcs: Vec<Func>,
    /// Source location
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyBuilder, Stmt, TypeExprKind};
    use qss_span::Position;
    use qss_types::Primitive;

    #[test]
    fn test_imported_packages_start_with_own_package() {
        let mut script = Script::new(ScriptPath::parse("src/a/main.qss"), "a".parse().unwrap());
        for package in ["b", "a", "c::d"] {
            script.imports.push(Import {
                package: package.parse().unwrap(),
                range: Range::default(),
            });
        }
        let names: Vec<String> = script
            .imported_packages()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["a", "b", "c::d"]);
    }

    #[test]
    fn test_set_hook_binds_this_and_value() {
        let field = Name::parse("health", Range::point(Position::new(3, 15)));
        let field_type = TypeExpr::primitive(Primitive::Int, Range::point(Position::new(3, 23)));
        let mut builder = BodyBuilder::new();
        let root = builder.stmt(Stmt::Block {
            statements: Vec::new(),
            range: Range::default(),
        });
        let hook = SetHook::new(
            HookTime::Before,
            Name::parse("Player", Range::point(Position::new(3, 8))),
            field.clone(),
            field_type.clone(),
            builder.finish(root),
            Range::default(),
        );

        assert_eq!(hook.signature.purity, Purity::Pure);
        assert_eq!(hook.signature.return_type, None);
        let params: Vec<(&str, &TypeExprKind)> = hook
            .signature
            .params
            .iter()
            .map(|param| (param.name.name.as_str(), &param.ty.kind))
            .collect();
        assert_eq!(
            params,
            [
                (THIS, &TypeExprKind::Named(hook.struct_name.clone())),
                (VALUE, &field_type.kind),
            ]
        );
        assert!(hook.signature.params.iter().all(|param| param.name.range == field.range));
    }

    #[test]
    fn test_new_struct_hook_returns_the_struct() {
        let mut builder = BodyBuilder::new();
        let root = builder.stmt(Stmt::Block {
            statements: Vec::new(),
            range: Range::default(),
        });
        let name = Name::parse("Player", Range::default());
        let hook = NewStructHook::new(name.clone(), builder.finish(root), Range::default());
        assert!(hook.signature.params.is_empty());
        assert_eq!(hook.signature.return_type, Some(TypeExpr::named(name)));
    }
}
