//! Function bodies: statements and expressions in arenas

use crate::{Ident, Name, TypeExpr};
use la_arena::{Arena, Idx};
use qss_span::Range;

/// Statement ID within a [`Body`]
pub type StmtId = Idx<Stmt>;

/// Expression ID within a [`Body`]
pub type ExprId = Idx<Expr>;

/// The statements and expressions of one function or hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    /// Expression arena
    pub exprs: Arena<Expr>,
    /// Statement arena
    pub stmts: Arena<Stmt>,
    /// The outermost block
    pub root: StmtId,
}

impl Body {
    /// Look up an expression
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    /// Look up a statement
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }
}

/// Allocates nodes for a [`Body`], children before parents
#[derive(Debug, Default)]
pub struct BodyBuilder {
    exprs: Arena<Expr>,
    stmts: Arena<Stmt>,
}

impl BodyBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression
    pub fn expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.alloc(expr)
    }

    /// Allocate a statement
    pub fn stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.alloc(stmt)
    }

    /// Finish the body with `root` as its outermost block
    #[must_use]
    pub fn finish(self, root: StmtId) -> Body {
        Body {
            exprs: self.exprs,
            stmts: self.stmts,
            root,
        }
    }
}

/// A statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `{ ... }`, a nested scope
    Block {
        /// Statements in order
        statements: Vec<StmtId>,
        /// Source location
        range: Range,
    },
    /// `let name = value;`
    LetAssign {
        /// Declared name
        name: Ident,
        /// Initial value
        value: ExprId,
        /// Source location
        range: Range,
    },
    /// `let name: Type;`
    LetWithType {
        /// Declared name
        name: Ident,
        /// Declared type
        ty: TypeExpr,
        /// Source location
        range: Range,
    },
    /// `target = value;`
    Assign {
        /// The assigned place
        target: ExprId,
        /// The assigned value
        value: ExprId,
        /// Source location
        range: Range,
    },
    /// An expression evaluated for its effects
    Evaluate {
        /// The expression
        expr: ExprId,
        /// Source location
        range: Range,
    },
    /// `if condition { ... } else { ... }`
    If {
        /// Condition, must be `Bool`
        condition: ExprId,
        /// Taken when the condition holds
        then_branch: StmtId,
        /// Taken otherwise
        else_branch: Option<StmtId>,
        /// Source location
        range: Range,
    },
    /// `while condition { ... }`
    While {
        /// Condition, must be `Bool`
        condition: ExprId,
        /// Loop body
        body: StmtId,
        /// Source location
        range: Range,
    },
    /// `return;` or `return value;`
    Return {
        /// Returned value
        value: Option<ExprId>,
        /// Source location
        range: Range,
    },
    /// `break;`
    Break {
        /// Source location
        range: Range,
    },
    /// `continue;`
    Continue {
        /// Source location
        range: Range,
    },
}

impl Stmt {
    /// Where the statement was written
    #[must_use]
    pub fn range(&self) -> Range {
        match self {
            Self::Block { range, .. }
            | Self::LetAssign { range, .. }
            | Self::LetWithType { range, .. }
            | Self::Assign { range, .. }
            | Self::Evaluate { range, .. }
            | Self::If { range, .. }
            | Self::While { range, .. }
            | Self::Return { range, .. }
            | Self::Break { range }
            | Self::Continue { range } => *range,
        }
    }
}

/// A literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// An integer
    Int(i64),
    /// `true` or `false`
    Bool(bool),
    /// A string
    String(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `and`
    And,
    /// `or`
    Or,
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!x`
    Not,
    /// `-x`
    Negate,
}

/// Operators on `maybe` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaybeOp {
    /// `just x`, wraps a value
    Just,
    /// `x?`, tests for presence
    Exists,
    /// `x!`, unwraps
    Get,
}

/// `field = value` inside `new S { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructFieldInit {
    /// Field name
    pub name: Name,
    /// Assigned value
    pub value: ExprId,
}

/// An expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A local variable or a function
    Identifier {
        /// The written name
        name: Name,
    },
    /// `result`, the return value inside `after` hooks
    Result {
        /// Source location
        range: Range,
    },
    /// `this`, the receiver of a function or the struct inside a set hook
    This {
        /// Source location
        range: Range,
    },
    /// A literal
    Literal {
        /// The value
        value: Literal,
        /// Source location
        range: Range,
    },
    /// `function(args)` or `receiver.function(args)`
    Call {
        /// The called expression
        function: ExprId,
        /// Arguments, receiver first when `receiver_style` is set
        args: Vec<ExprId>,
        /// Whether the call was written with receiver syntax
        receiver_style: bool,
        /// Source location
        range: Range,
    },
    /// `receiver.field`
    Field {
        /// The struct value
        receiver: ExprId,
        /// Field name
        field: Name,
        /// Source location
        range: Range,
    },
    /// `container[index]`, an element of a list or a value of a map
    Index {
        /// The list or map
        container: ExprId,
        /// Position in a list or key of a map
        index: ExprId,
        /// Source location
        range: Range,
    },
    /// `lhs op rhs`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: ExprId,
        /// Right operand
        rhs: ExprId,
        /// Source location
        range: Range,
    },
    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: ExprId,
        /// Source location
        range: Range,
    },
    /// `just x`, `x?` or `x!`
    Maybe {
        /// Operator
        op: MaybeOp,
        /// Operand
        operand: ExprId,
        /// Source location
        range: Range,
    },
    /// `null T`, an absent value of type `T?`
    Null {
        /// The contained type
        ty: TypeExpr,
        /// Source location
        range: Range,
    },
    /// `new [T]`
    NewList {
        /// The list type
        ty: TypeExpr,
        /// Source location
        range: Range,
    },
    /// `new {K => V}`
    NewMap {
        /// The map type
        ty: TypeExpr,
        /// Source location
        range: Range,
    },
    /// `new S { field = value, ... }`
    NewStruct {
        /// Struct name
        name: Name,
        /// Field initializers
        fields: Vec<StructFieldInit>,
        /// Source location
        range: Range,
    },
}

impl Expr {
    /// Where the expression was written
    #[must_use]
    pub fn range(&self) -> Range {
        match self {
            Self::Identifier { name } => name.range,
            Self::Result { range } | Self::This { range } => *range,
            Self::Literal { range, .. }
            | Self::Call { range, .. }
            | Self::Field { range, .. }
            | Self::Index { range, .. }
            | Self::Binary { range, .. }
            | Self::Unary { range, .. }
            | Self::Maybe { range, .. }
            | Self::Null { range, .. }
            | Self::NewList { range, .. }
            | Self::NewMap { range, .. }
            | Self::NewStruct { range, .. } => *range,
        }
    }
}
