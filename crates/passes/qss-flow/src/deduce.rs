//! Expression type deduction

use crate::{FlowFunction, FunctionKind, ScopeTree, VariableUsageState};
use la_arena::ArenaMap;
use qss_ast::{
    BinaryOp, Body, Expr, ExprId, HookTime, Literal, MaybeOp, Name, Script, StructFieldInit, THIS,
    TypeExpr, UnaryOp,
};
use qss_diagnostics::{Message, RelatedInformation};
use qss_index::TypeResolver as _;
use qss_name::QualifiedName;
use qss_resolve::{Resolver, SymbolTarget, TraitChecker, resolve_type_parameters, similar_names};
use qss_span::{Location, Range};
use qss_types::{CastChecker, FunctionType, Primitive, VariableType};

/// Deduced type of every evaluated expression of one body
pub type ExprTypes = ArenaMap<ExprId, VariableType>;

/// Deduces expression types and records variable reads and writes in a [`ScopeTree`]
pub struct Deducer<'walk> {
    resolver: &'walk Resolver<'walk>,
    traits: TraitChecker<'walk>,
    script: &'walk Script,
    function: &'walk FlowFunction<'walk>,
    body: &'walk Body,
    messages: Vec<Message>,
    types: ExprTypes,
}

impl<'walk> Deducer<'walk> {
    pub fn new(
        resolver: &'walk Resolver<'walk>,
        script: &'walk Script,
        function: &'walk FlowFunction<'walk>,
    ) -> Self {
        Self {
            resolver,
            traits: TraitChecker::new(resolver, script),
            script,
            function,
            body: function.body,
            messages: Vec::new(),
            types: ExprTypes::default(),
        }
    }

    pub fn report(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn location(&self, range: Range) -> Location {
        Location::new(self.script.path.clone(), range)
    }

    pub fn into_parts(self) -> (Vec<Message>, ExprTypes) {
        (self.messages, self.types)
    }

    /// Report at `range` unless `source` may be used as `target`
    pub fn downcast(&mut self, range: Range, source: &VariableType, target: &VariableType) {
        let outcome = CastChecker::new(&self.traits).attempt_downcast(range, source, target);
        outcome.report_into(&mut self.messages);
    }

    /// Resolve a written type, falling back to unknown
    pub fn resolve_type(&mut self, what: &str, ty: &TypeExpr) -> VariableType {
        self.resolver
            .resolve_type(self.script, self.function.this_type.as_ref(), what, ty)
            .report_into(&mut self.messages)
            .unwrap_or(VariableType::UNKNOWN)
    }

    /// Evaluate `id` for its value, recording its type
    pub fn rvalue(&mut self, id: ExprId, scope: &mut ScopeTree) -> VariableType {
        let body = self.body;
        let ty = match body.expr(id) {
            Expr::Identifier { name } => self.identifier(name, scope),
            Expr::Result { range } => self.read_result(*range, scope),
            Expr::This { range } => self.read_this(*range, scope),
            Expr::Literal { value, .. } => match value {
                Literal::Int(_) => VariableType::INT,
                Literal::Bool(_) => VariableType::BOOL,
                Literal::String(_) => VariableType::STRING,
            },
            Expr::Call {
                function,
                args,
                receiver_style,
                ..
            } => self.call(*function, args, *receiver_style, scope),
            Expr::Field {
                receiver, field, ..
            } => self.field(*receiver, field, scope),
            Expr::Index {
                container, index, ..
            } => self.index(*container, *index, scope),
            Expr::Binary { op, lhs, rhs, .. } => self.binary(*op, *lhs, *rhs, scope),
            Expr::Unary { op, operand, .. } => self.unary(*op, *operand, scope),
            Expr::Maybe { op, operand, .. } => self.maybe(*op, *operand, scope),
            Expr::Null { ty, .. } => match self.resolve_type("null", ty) {
                VariableType::Primitive(Primitive::Unknown) => VariableType::UNKNOWN,
                contained => VariableType::maybe(contained),
            },
            Expr::NewList { ty, .. } => match self.resolve_type("new list", ty) {
                list @ (VariableType::List(_) | VariableType::Primitive(Primitive::Unknown)) => list,
                other => {
                    self.report(Message::error(ty.range, format!("Expected a list type, got {other}")));
                    VariableType::UNKNOWN
                }
            },
            Expr::NewMap { ty, .. } => match self.resolve_type("new map", ty) {
                map @ (VariableType::Map { .. } | VariableType::Primitive(Primitive::Unknown)) => map,
                other => {
                    self.report(Message::error(ty.range, format!("Expected a map type, got {other}")));
                    VariableType::UNKNOWN
                }
            },
            Expr::NewStruct { name, fields, .. } => self.new_struct(name, fields, scope),
        };
        self.types.insert(id, ty.clone());
        ty
    }

    /// Evaluate `id` as the target of an assignment at `at`, returning the type it must receive
    ///
    /// Returns `None` if the target is invalid; the error has been reported.
    pub fn lvalue(&mut self, id: ExprId, at: Range, scope: &mut ScopeTree) -> Option<VariableType> {
        let body = self.body;
        let ty = match body.expr(id) {
            Expr::Identifier { name } => {
                let Some(state) = local(name, scope) else {
                    let message = self.unresolved_local(name, scope);
                    self.report(message);
                    return None;
                };
                let assigned = state.assign(at);
                self.bind_local(name.range, &assigned);
                let ty = assigned.ty.clone();
                scope.insert(assigned);
                ty
            }
            Expr::Result { range } => {
                let state = self.result_state(*range, scope)?;
                let ty = state.ty.clone();
                scope.set_result(state.assign(at));
                ty
            }
            Expr::Field {
                receiver, field, ..
            } => self.field(*receiver, field, scope),
            other => {
                self.report(Message::error(
                    other.range(),
                    "Only variables, fields and 'result' can be assigned to",
                ));
                return None;
            }
        };
        self.types.insert(id, ty.clone());
        Some(ty)
    }

    fn identifier(&mut self, name: &Name, scope: &mut ScopeTree) -> VariableType {
        if let Some(state) = local(name, scope) {
            let (read, error) = state.read(name.range);
            self.bind_local(name.range, &read);
            let ty = read.ty.clone();
            scope.insert(read);
            self.messages.extend(error);
            return ty;
        }

        let (resolved, mut messages) = self
            .resolver
            .resolve_func(self.script, name, "name")
            .into_parts();
        if let (None, Some(first), Some(related)) =
            (&resolved, messages.first_mut(), self.suggestion(name, scope))
        {
            first.related.push(related);
        }
        self.messages.extend(messages);
        resolved
            .and_then(|found| found.definition.ty)
            .map_or(VariableType::UNKNOWN, VariableType::Function)
    }

    fn unresolved_local(&self, name: &Name, scope: &ScopeTree) -> Message {
        let mut message = Message::error(name.range, format!("Could not resolve name {name}"));
        message.related.extend(self.suggestion(name, scope));
        message
    }

    /// `Did you mean X?` pointing at the closest visible variable
    fn suggestion(&self, name: &Name, scope: &ScopeTree) -> Option<RelatedInformation> {
        let closest = similar_names(name.last(), scope.names()).into_iter().next()?;
        let state = scope.get(closest)?;
        Some(RelatedInformation {
            location: self.location(state.definition),
            message: format!("Did you mean {closest}?"),
        })
    }

    /// Record the variable `state` as the target of the name written at `range`
    pub fn bind_local(&self, range: Range, state: &VariableUsageState) {
        let Ok(name) = QualifiedName::new([state.name.as_str()]) else {
            return;
        };
        self.resolver.bind(
            range,
            SymbolTarget {
                name,
                location: self.location(state.definition),
                documentation: Some(format!("{}: {}", state.name, state.ty)),
            },
        );
    }

    /// The state of `result`, or `None` with an error if it is unavailable here
    fn result_state(&mut self, range: Range, scope: &ScopeTree) -> Option<VariableUsageState> {
        let unavailable = match self.function.kind {
            FunctionKind::Func => "The 'result' variable is not available in functions",
            FunctionKind::Hook(HookTime::Before) => {
                "The 'result' variable is not available in 'before' hooks"
            }
            FunctionKind::Hook(HookTime::After) => match scope.result() {
                Some(state) => return Some(state.clone()),
                None => {
                    "This function doesn't return a value, so the 'result' variable is not available"
                }
            },
        };
        self.report(Message::error(range, unavailable));
        None
    }

    fn read_result(&mut self, range: Range, scope: &mut ScopeTree) -> VariableType {
        let Some(state) = self.result_state(range, scope) else {
            return VariableType::UNKNOWN;
        };
        let (read, error) = state.read(range);
        let ty = read.ty.clone();
        scope.set_result(read);
        self.messages.extend(error);
        ty
    }

    /// The receiver of a function taking `this`, or the struct of a set hook
    fn read_this(&mut self, range: Range, scope: &mut ScopeTree) -> VariableType {
        let Some(state) = scope.get(THIS) else {
            self.report(Message::error(range, "The 'this' variable is not available here"));
            return VariableType::UNKNOWN;
        };
        let (read, error) = state.read(range);
        self.bind_local(range, &read);
        let ty = read.ty.clone();
        scope.insert(read);
        self.messages.extend(error);
        ty
    }

    /// `container[index]`: an `Int` position into a list or a key into a map, yielding a `maybe`
    fn index(&mut self, container: ExprId, index: ExprId, scope: &mut ScopeTree) -> VariableType {
        let container_type = self.rvalue(container, scope);
        let index_type = self.rvalue(index, scope);
        let index_range = self.body.expr(index).range();
        match container_type {
            VariableType::List(element) => {
                self.downcast(index_range, &index_type, &VariableType::INT);
                VariableType::Maybe(element)
            }
            VariableType::Map { key, value } => {
                self.downcast(index_range, &index_type, &key);
                VariableType::Maybe(value)
            }
            VariableType::Primitive(Primitive::Unknown) => VariableType::UNKNOWN,
            other => {
                let range = self.body.expr(container).range();
                self.report(Message::error(
                    range,
                    format!("Expected a list or map, got expression of type {other}"),
                ));
                VariableType::UNKNOWN
            }
        }
    }

    fn call(
        &mut self,
        function: ExprId,
        args: &[ExprId],
        receiver_style: bool,
        scope: &mut ScopeTree,
    ) -> VariableType {
        let callee = self.rvalue(function, scope);
        let arg_types: Vec<VariableType> = args.iter().map(|arg| self.rvalue(*arg, scope)).collect();
        let function_range = self.body.expr(function).range();

        let function_type = match callee {
            VariableType::Function(function_type) => function_type,
            VariableType::Primitive(Primitive::Unknown) => return VariableType::UNKNOWN,
            other => {
                self.report(Message::error(function_range, format!("Expected function, got {other}")));
                return VariableType::UNKNOWN;
            }
        };
        if arg_types.iter().any(VariableType::is_unknown) {
            return function_type.return_type.replace_this(&VariableType::UNKNOWN);
        }

        if let Some(mismatch) = arity_mismatch(&function_type, arg_types.len(), receiver_style) {
            self.report(Message::error(function_range, mismatch));
            return function_type.return_type.replace_this(&VariableType::UNKNOWN);
        }

        let this_type = match (&function_type.container_trait, args.first(), arg_types.first()) {
            (Some(trait_name), Some(receiver), Some(receiver_type)) => {
                let range = self.body.expr(*receiver).range();
                self.traits
                    .does_implement(range, receiver_type, trait_name)
                    .report_into(&mut self.messages);
                Some(receiver_type.clone())
            }
            _ => None,
        };

        for ((arg, arg_type), param_type) in args.iter().zip(&arg_types).zip(&function_type.params) {
            let range = self.body.expr(*arg).range();
            let expected = resolve_type_parameters(range, param_type, this_type.as_ref())
                .report_into(&mut self.messages)
                .unwrap_or(VariableType::UNKNOWN);
            self.downcast(range, arg_type, &expected);
        }

        let caller = scope.function.purity;
        if !function_type.purity.can_execute_inside(caller) {
            self.report(Message::error(
                function_range,
                format!(
                    "Cannot execute function of purity {} inside function of purity {caller}",
                    function_type.purity
                ),
            ));
        }

        function_type
            .return_type
            .replace_this(this_type.as_ref().unwrap_or(&VariableType::UNKNOWN))
    }

    fn field(&mut self, receiver: ExprId, field: &Name, scope: &mut ScopeTree) -> VariableType {
        match self.rvalue(receiver, scope) {
            VariableType::Struct(struct_name) => self
                .resolver
                .resolve_struct_field(self.script, &struct_name, field)
                .report_into(&mut self.messages)
                .map_or(VariableType::UNKNOWN, |resolved| resolved.definition.ty),
            VariableType::Primitive(Primitive::Unknown) => VariableType::UNKNOWN,
            other => {
                let range = self.body.expr(receiver).range();
                self.report(Message::error(
                    range,
                    format!("Expected a struct, got expression of type {other}"),
                ));
                VariableType::UNKNOWN
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, scope: &mut ScopeTree) -> VariableType {
        let left = self.rvalue(lhs, scope);
        let right = self.rvalue(rhs, scope);
        let lhs_range = self.body.expr(lhs).range();
        let rhs_range = self.body.expr(rhs).range();
        match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                self.arithmetic(op, (lhs_range, &left), (rhs_range, &right))
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                self.downcast(rhs_range, &right, &left);
                VariableType::BOOL
            }
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                self.expect_number(lhs_range, &left);
                self.expect_number(rhs_range, &right);
                VariableType::BOOL
            }
            BinaryOp::And | BinaryOp::Or => {
                self.downcast(lhs_range, &left, &VariableType::BOOL);
                self.downcast(rhs_range, &right, &VariableType::BOOL);
                VariableType::BOOL
            }
        }
    }

    fn arithmetic(
        &mut self,
        op: BinaryOp,
        (lhs_range, left): (Range, &VariableType),
        (rhs_range, right): (Range, &VariableType),
    ) -> VariableType {
        if left.is_unknown() || right.is_unknown() {
            return VariableType::UNKNOWN;
        }
        let noun = match op {
            BinaryOp::Subtract => "subtraction",
            BinaryOp::Multiply => "multiplication",
            BinaryOp::Divide => "division",
            _ => "addition",
        };
        if !is_number(left) {
            self.report(Message::error(
                lhs_range,
                format!("Expected left hand side of type Int or Ratio in {noun} expression, got {left}"),
            ));
            return VariableType::UNKNOWN;
        }
        if !is_number(right) {
            let related = self.location(lhs_range);
            self.report(
                Message::error(
                    rhs_range,
                    format!(
                        "Expected right hand side of type Int or Ratio in {noun} expression, got {right}"
                    ),
                )
                .with_related(
                    related,
                    format!("Required because the left hand side of this expression is of type {left}"),
                ),
            );
            return VariableType::UNKNOWN;
        }
        if op == BinaryOp::Divide || *left == VariableType::RATIO || *right == VariableType::RATIO {
            VariableType::RATIO
        } else {
            VariableType::INT
        }
    }

    fn expect_number(&mut self, range: Range, ty: &VariableType) {
        if !ty.is_unknown() && !is_number(ty) {
            self.report(Message::error(
                range,
                format!("Expected an expression of type Int or Ratio, got {ty}"),
            ));
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: ExprId, scope: &mut ScopeTree) -> VariableType {
        let ty = self.rvalue(operand, scope);
        let range = self.body.expr(operand).range();
        match op {
            UnaryOp::Not => {
                self.downcast(range, &ty, &VariableType::BOOL);
                VariableType::BOOL
            }
            UnaryOp::Negate if ty.is_unknown() || is_number(&ty) => ty,
            UnaryOp::Negate => {
                self.expect_number(range, &ty);
                VariableType::UNKNOWN
            }
        }
    }

    fn maybe(&mut self, op: MaybeOp, operand: ExprId, scope: &mut ScopeTree) -> VariableType {
        let ty = self.rvalue(operand, scope);
        if ty.is_unknown() {
            return if op == MaybeOp::Exists {
                VariableType::BOOL
            } else {
                VariableType::UNKNOWN
            };
        }
        match (op, ty) {
            (MaybeOp::Just, contained) => VariableType::maybe(contained),
            (MaybeOp::Exists, VariableType::Maybe(_)) => VariableType::BOOL,
            (MaybeOp::Get, VariableType::Maybe(contained)) => *contained,
            (_, other) => {
                let range = self.body.expr(operand).range();
                self.report(Message::error(range, format!("Expected a 'maybe' expression, got {other}")));
                if op == MaybeOp::Exists {
                    VariableType::BOOL
                } else {
                    VariableType::UNKNOWN
                }
            }
        }
    }

    fn new_struct(
        &mut self,
        name: &Name,
        fields: &[StructFieldInit],
        scope: &mut ScopeTree,
    ) -> VariableType {
        let values: Vec<VariableType> = fields
            .iter()
            .map(|init| self.rvalue(init.value, scope))
            .collect();
        let Some(resolved) = self
            .resolver
            .resolve_struct(self.script, name)
            .report_into(&mut self.messages)
        else {
            return VariableType::UNKNOWN;
        };

        for (init, value) in fields.iter().zip(&values) {
            let Some(field) = self
                .resolver
                .resolve_struct_field(self.script, &resolved.name, &init.name)
                .report_into(&mut self.messages)
            else {
                continue;
            };
            if field.definition.ty.is_unknown() {
                self.report(Message::error(
                    init.name.range,
                    format!(
                        "Field {} had an unknown type; this is usually caused by not including a \
                         required dependency",
                        init.name
                    ),
                ));
                continue;
            }
            let range = self.body.expr(init.value).range();
            self.downcast(range, value, &field.definition.ty);
        }

        for field_name in resolved.definition.fields.keys() {
            if !fields.iter().any(|init| init.name.is_local(field_name)) {
                self.report(Message::error(
                    name.range,
                    format!("Field {field_name} must be assigned when creating a new {}", resolved.name),
                ));
            }
        }
        VariableType::Struct(resolved.name)
    }
}

/// The visible variable an unqualified name refers to
fn local<'scope>(name: &Name, scope: &'scope ScopeTree) -> Option<&'scope VariableUsageState> {
    match name.segments.as_slice() {
        [only] => scope.get(only),
        _ => None,
    }
}

fn is_number(ty: &VariableType) -> bool {
    *ty == VariableType::INT || *ty == VariableType::RATIO
}

/// The error for a call whose arguments do not fit the parameters, if they do not
fn arity_mismatch(function: &FunctionType, supplied: usize, receiver_style: bool) -> Option<String> {
    let parameter_count = function
        .params
        .len()
        .saturating_sub(usize::from(function.receiver_style));
    let argument_count = supplied.saturating_sub(usize::from(receiver_style));
    let count_mismatch = parameter_count != argument_count;
    let style_mismatch = receiver_style != function.receiver_style;
    let receiver = |present: bool| if present { "a receiver" } else { "no receiver" };

    if count_mismatch && style_mismatch {
        Some(format!(
            "Function expected {} and {parameter_count} parameters, but {} and {argument_count} \
             arguments were supplied",
            receiver(function.receiver_style),
            receiver(receiver_style)
        ))
    } else if count_mismatch {
        Some(format!(
            "Function expected {parameter_count} parameters, but {argument_count} arguments were \
             supplied"
        ))
    } else if style_mismatch {
        Some(format!(
            "Function expected {}, but {} was supplied",
            receiver(function.receiver_style),
            receiver(receiver_style)
        ))
    } else {
        None
    }
}
