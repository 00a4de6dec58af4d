//! Integration test utilities for the QSS front end
//!
//! Scripts are assembled line by line with [`ScriptBuilder`] and [`BodySource`], added to a
//! [`Fixture`], indexed and analyzed through a [`Session`]. Every name written on line `n` gets
//! the range `n:5-n:13` (one-indexed) so snapshots stay readable.

use qss_ast::{
    BinaryOp, Body, BodyBuilder, Expr, ExprId, Field, Func, FuncBody, FuncHook, HookTime, Ident, Import,
    Literal, Name, NewStructHook, Param, Script, SetHook, Signature, Stmt, StmtId, Struct, Trait,
    TraitFunc, TraitImpl, TypeExpr,
};
use qss_diagnostics::{Message, render};
use qss_driver::{Analysis, Session};
use qss_index::DEFAULT_BUNDLE;
use qss_name::{QualifiedName, ScriptPath};
use qss_span::{Position, Range};
use qss_types::{Primitive, Purity};

/// The range of anything written on zero-indexed `line`
#[must_use]
pub fn at(line: u32) -> Range {
    Range::new(Position::new(line, 4), Position::new(line, 12))
}

/// A block from `first` to `last`, zero-indexed and inclusive
#[must_use]
pub fn span(first: u32, last: u32) -> Range {
    Range::new(Position::new(first, 0), Position::new(last, 1))
}

/// A qualified name from its `::`-separated form
///
/// # Panics
///
/// Panics on an empty segment.
#[must_use]
pub fn qualified(name: &str) -> QualifiedName {
    name.parse().unwrap_or_else(|error| panic!("bad name {name}: {error}"))
}

/// A primitive type written on `line`
#[must_use]
pub fn primitive(primitive: Primitive, line: u32) -> TypeExpr {
    TypeExpr::primitive(primitive, at(line))
}

/// A named type written on `line`
#[must_use]
pub fn named(name: &str, line: u32) -> TypeExpr {
    TypeExpr::named(Name::parse(name, at(line)))
}

/// A signature whose parameters are all written on `line`
#[must_use]
pub fn signature(purity: Purity, params: Vec<(&str, TypeExpr)>, return_type: Option<TypeExpr>, line: u32) -> Signature {
    Signature {
        purity,
        receiver_style: false,
        params: params
            .into_iter()
            .map(|(name, ty)| Param {
                name: Ident::new(name, at(line)),
                ty,
            })
            .collect(),
        return_type,
    }
}

/// An impure signature with no parameters and no return type
#[must_use]
pub fn plain() -> Signature {
    signature(Purity::Impure, Vec::new(), None, 0)
}

/// A function with a body
#[must_use]
pub fn func(name: &str, signature: Signature, body: Body, line: u32) -> Func {
    Func {
        name: Ident::new(name, at(line)),
        documentation: None,
        signature,
        body: FuncBody::Block(body),
        range: at(line),
    }
}

/// A native function, implemented by the host
#[must_use]
pub fn native(name: &str, signature: Signature, line: u32) -> Func {
    Func {
        name: Ident::new(name, at(line)),
        documentation: Some(format!("The {name} function")),
        signature,
        body: FuncBody::Native,
        range: at(line),
    }
}

/// Builds a function body line by line
#[derive(Default)]
pub struct BodySource {
    builder: BodyBuilder,
}

impl BodySource {
    /// An empty body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An integer literal
    pub fn int(&mut self, value: i64, line: u32) -> ExprId {
        self.builder.expr(Expr::Literal {
            value: Literal::Int(value),
            range: at(line),
        })
    }

    /// `true`
    pub fn truth(&mut self, line: u32) -> ExprId {
        self.builder.expr(Expr::Literal {
            value: Literal::Bool(true),
            range: at(line),
        })
    }

    /// A string literal
    pub fn text(&mut self, text: &str, line: u32) -> ExprId {
        self.builder.expr(Expr::Literal {
            value: Literal::String(text.to_owned()),
            range: at(line),
        })
    }

    /// A variable or function name
    pub fn name(&mut self, name: &str, line: u32) -> ExprId {
        self.builder.expr(Expr::Identifier {
            name: Name::parse(name, at(line)),
        })
    }

    /// `this`
    pub fn this(&mut self, line: u32) -> ExprId {
        self.builder.expr(Expr::This { range: at(line) })
    }

    /// `result`
    pub fn result(&mut self, line: u32) -> ExprId {
        self.builder.expr(Expr::Result { range: at(line) })
    }

    /// `receiver.field`
    pub fn field(&mut self, receiver: ExprId, field: &str, line: u32) -> ExprId {
        self.builder.expr(Expr::Field {
            receiver,
            field: Name::parse(field, at(line)),
            range: at(line),
        })
    }

    /// `lhs op rhs`
    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, line: u32) -> ExprId {
        self.builder.expr(Expr::Binary {
            op,
            lhs,
            rhs,
            range: at(line),
        })
    }

    /// `container[index]`
    pub fn index(&mut self, container: ExprId, index: ExprId, line: u32) -> ExprId {
        self.builder.expr(Expr::Index {
            container,
            index,
            range: at(line),
        })
    }

    /// `name(args)`
    pub fn call(&mut self, name: &str, args: Vec<ExprId>, line: u32) -> ExprId {
        let function = self.name(name, line);
        self.builder.expr(Expr::Call {
            function,
            args,
            receiver_style: false,
            range: at(line),
        })
    }

    /// `let name: ty;`
    pub fn let_typed(&mut self, name: &str, ty: TypeExpr, line: u32) -> StmtId {
        self.builder.stmt(Stmt::LetWithType {
            name: Ident::new(name, at(line)),
            ty,
            range: at(line),
        })
    }

    /// `let name = value;`
    pub fn let_value(&mut self, name: &str, value: ExprId, line: u32) -> StmtId {
        self.builder.stmt(Stmt::LetAssign {
            name: Ident::new(name, at(line)),
            value,
            range: at(line),
        })
    }

    /// `target = value;` for any assignable expression
    pub fn assign_to(&mut self, target: ExprId, value: ExprId, line: u32) -> StmtId {
        self.builder.stmt(Stmt::Assign {
            target,
            value,
            range: at(line),
        })
    }

    /// `name = value;`
    pub fn assign(&mut self, name: &str, value: ExprId, line: u32) -> StmtId {
        let target = self.name(name, line);
        self.builder.stmt(Stmt::Assign {
            target,
            value,
            range: at(line),
        })
    }

    /// `expr;`
    pub fn eval(&mut self, expr: ExprId, line: u32) -> StmtId {
        self.builder.stmt(Stmt::Evaluate {
            expr,
            range: at(line),
        })
    }

    /// `return value;`
    pub fn ret(&mut self, value: Option<ExprId>, line: u32) -> StmtId {
        self.builder.stmt(Stmt::Return {
            value,
            range: at(line),
        })
    }

    /// `if true { then_branch }` spanning `first` to `last`
    pub fn if_then(&mut self, then_branch: StmtId, first: u32, last: u32) -> StmtId {
        let condition = self.truth(first);
        self.builder.stmt(Stmt::If {
            condition,
            then_branch,
            else_branch: None,
            range: span(first, last),
        })
    }

    /// `if true { then_branch } else { else_branch }` spanning `first` to `last`
    pub fn if_else(&mut self, then_branch: StmtId, else_branch: StmtId, first: u32, last: u32) -> StmtId {
        let condition = self.truth(first);
        self.builder.stmt(Stmt::If {
            condition,
            then_branch,
            else_branch: Some(else_branch),
            range: span(first, last),
        })
    }

    /// `{ statements }` spanning `first` to `last`
    pub fn block(&mut self, statements: Vec<StmtId>, first: u32, last: u32) -> StmtId {
        self.builder.stmt(Stmt::Block {
            statements,
            range: span(first, last),
        })
    }

    /// The finished body, rooted at `root`
    #[must_use]
    pub fn finish(self, root: StmtId) -> Body {
        self.builder.finish(root)
    }
}

/// Builds a script item by item
pub struct ScriptBuilder {
    script: Script,
}

impl ScriptBuilder {
    /// A script at `path` (such as `src/main/main.qss`) in `package`
    #[must_use]
    pub fn new(path: &str, package: &str) -> Self {
        Self {
            script: Script::new(ScriptPath::parse(path), qualified(package)),
        }
    }

    /// `import package;`
    #[must_use]
    pub fn import(mut self, package: &str) -> Self {
        self.script.imports.push(Import {
            package: qualified(package),
            range: Range::default(),
        });
        self
    }

    /// `struct name { fields }` with every field on the next line
    #[must_use]
    pub fn structure(mut self, name: &str, fields: Vec<(&str, TypeExpr)>, line: u32) -> Self {
        self.script.structs.push(Struct {
            name: Ident::new(name, at(line)),
            documentation: None,
            fields: fields
                .into_iter()
                .map(|(field, ty)| Field {
                    name: Ident::new(field, at(line + 1)),
                    documentation: None,
                    ty,
                    range: at(line + 1),
                })
                .collect(),
            range: at(line),
        });
        self
    }

    /// A function
    #[must_use]
    pub fn func(mut self, func: Func) -> Self {
        self.script.funcs.push(func);
        self
    }

    /// `trait name { funcs }`, one function per line after `line`
    #[must_use]
    pub fn trait_def(mut self, name: &str, funcs: Vec<(&str, Signature)>, line: u32) -> Self {
        self.script.traits.push(Trait {
            name: Ident::new(name, at(line)),
            documentation: None,
            funcs: funcs
                .into_iter()
                .zip(line + 1..)
                .map(|((func, signature), func_line)| TraitFunc {
                    name: Ident::new(func, at(func_line)),
                    documentation: None,
                    signature,
                    range: at(func_line),
                })
                .collect(),
            range: at(line),
        });
        self
    }

    /// `impl trait_name for for_type { funcs }`
    #[must_use]
    pub fn trait_impl(mut self, trait_name: &str, for_type: TypeExpr, funcs: Vec<Func>, line: u32) -> Self {
        self.script.trait_impls.push(TraitImpl {
            trait_name: Name::parse(trait_name, at(line)),
            for_type,
            funcs,
            range: at(line),
        });
        self
    }

    /// A `before` or `after` hook on `target`
    #[must_use]
    pub fn hook(mut self, time: HookTime, target: &str, signature: Signature, body: Body, line: u32) -> Self {
        self.script.hooks.push(FuncHook {
            time,
            target: Name::parse(target, at(line)),
            signature,
            body,
            range: at(line),
        });
        self
    }

    /// `before set` or `after set` hook on `struct_name.field`, all written on `line`
    #[must_use]
    pub fn set_hook(
        mut self,
        time: HookTime,
        (struct_name, field): (&str, &str),
        field_type: TypeExpr,
        body: Body,
        line: u32,
    ) -> Self {
        self.script.set_hooks.push(SetHook::new(
            time,
            Name::parse(struct_name, at(line)),
            Name::parse(field, at(line)),
            field_type,
            body,
            at(line),
        ));
        self
    }

    /// `after new struct_name { ... }`
    #[must_use]
    pub fn new_hook(mut self, struct_name: &str, body: Body, line: u32) -> Self {
        self.script
            .new_hooks
            .push(NewStructHook::new(Name::parse(struct_name, at(line)), body, at(line)));
        self
    }

    /// The finished script
    #[must_use]
    pub fn build(self) -> Script {
        self.script
    }
}

/// A session over scripts added in memory
#[derive(Default)]
pub struct Fixture {
    session: Session,
}

impl Fixture {
    /// An empty fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script to the default bundle
    #[must_use]
    pub fn with(mut self, script: Script) -> Self {
        self.session.add_script(DEFAULT_BUNDLE, script);
        self
    }

    /// Add a script to another bundle
    #[must_use]
    pub fn with_in(mut self, bundle: &str, script: Script) -> Self {
        self.session.add_script(bundle, script);
        self
    }

    /// The underlying session
    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Index everything, then analyze the script at `path` of the default bundle
    ///
    /// # Panics
    ///
    /// Panics if no script was added at `path`.
    pub fn analyze(&mut self, path: &str) -> Analysis {
        self.session.index();
        self.session
            .analyze_script(DEFAULT_BUNDLE, &ScriptPath::parse(path))
            .unwrap_or_else(|| panic!("no script at {path}"))
    }

    /// The rendered diagnostics of the script at `path`
    ///
    /// # Panics
    ///
    /// Panics if no script was added at `path`.
    pub fn diagnostics(&mut self, path: &str) -> String {
        snapshot(&self.analyze(path).messages)
    }
}

/// Messages one per line, each followed by a newline, for `expect!` snapshots
#[must_use]
pub fn snapshot(messages: &[Message]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    format!("{}\n", render(messages))
}

/// `src/main/main.qss` in package `main` containing one impure function `main` with `body`
#[must_use]
pub fn main_script(body: Body) -> ScriptBuilder {
    ScriptBuilder::new(MAIN, "main").func(func("main", plain(), body, 0))
}

/// Path of the script built by [`main_script`]
pub const MAIN: &str = "src/main/main.qss";

/// Package `lib` with an impure `shout` and a pure `double`, each returning nothing
#[must_use]
pub fn library() -> Script {
    ScriptBuilder::new("src/lib/lib.qss", "lib")
        .func(native("shout", signature(Purity::Impure, Vec::new(), None, 0), 0))
        .func(native("double", signature(Purity::Pure, Vec::new(), None, 1), 1))
        .build()
}

/// Package `name` with a single native function `go`
#[must_use]
pub fn go_package(name: &str) -> Script {
    ScriptBuilder::new(&format!("src/{name}/{name}.qss"), name)
        .func(native("go", plain(), 0))
        .build()
}
