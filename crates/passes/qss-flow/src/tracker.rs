//! Definite-assignment walk over a function body

use crate::deduce::{Deducer, ExprTypes};
use crate::{FlowError, FlowFunction, FunctionKind, ScopeTree, VariableUsageState, missing_blocks};
use qss_ast::{Body, ExprId, HookTime, Ident, Script, Stmt, StmtId};
use qss_diagnostics::Message;
use qss_resolve::Resolver;
use qss_span::Range;
use qss_types::VariableType;

/// Everything learnt from one function body
#[derive(Debug)]
pub struct FlowOutcome {
    /// Diagnostics, in the order they were found
    pub messages: Vec<Message>,
    /// Deduced type of every evaluated expression
    pub types: ExprTypes,
}

/// Checks that every local variable is assigned before it is read
///
/// Also deduces expression types, checks calls, returns and loop control, and reports unused
/// variables.
pub struct VariableTracker<'ctx> {
    resolver: &'ctx Resolver<'ctx>,
    script: &'ctx Script,
}

impl<'ctx> VariableTracker<'ctx> {
    /// A tracker for functions written in `script`
    #[must_use]
    pub fn new(resolver: &'ctx Resolver<'ctx>, script: &'ctx Script) -> Self {
        Self { resolver, script }
    }

    /// Walk `function`'s body
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] if the analyzer reached an inconsistent state. No diagnostics are
    /// produced for the function in that case.
    pub fn track(&self, function: &FlowFunction<'_>) -> Result<FlowOutcome, FlowError> {
        let mut walker = Walker {
            deducer: Deducer::new(self.resolver, self.script, function),
            function,
            body: function.body,
        };
        let root = function.body.stmt(function.body.root).range();
        let mut scope = walker.entry_scope(root);
        walker.statement(function.body.root, &mut Frame::new(root), &mut scope)?;
        walker.check_returned(&scope);

        let (messages, types) = walker.deducer.into_parts();
        tracing::trace!(path = %self.script.path, messages = messages.len(), "tracked function");
        Ok(FlowOutcome { messages, types })
    }
}

/// Names declared by one block, and the outer variables they hide
struct Frame {
    range: Range,
    declared: Vec<String>,
    shadowed: Vec<VariableUsageState>,
}

impl Frame {
    fn new(range: Range) -> Self {
        Self {
            range,
            declared: Vec::new(),
            shadowed: Vec::new(),
        }
    }
}

struct Walker<'walk> {
    deducer: Deducer<'walk>,
    function: &'walk FlowFunction<'walk>,
    body: &'walk Body,
}

impl Walker<'_> {
    /// Parameters assigned, `result` seeded if the function returns something
    fn entry_scope(&mut self, root: Range) -> ScopeTree {
        let function = self.function;
        let mut scope = ScopeTree::new(function.purity);
        for (param, ty) in &function.params {
            if let Some(previous) = scope.get(&param.name) {
                let location = self.deducer.location(previous.definition);
                self.deducer.report(
                    Message::error(param.range, format!("Parameter {param} was already defined"))
                        .with_related(location, "Previously defined here"),
                );
                continue;
            }
            let declared = VariableUsageState::new(param.name.clone(), param.range, root, ty.clone());
            scope.insert(declared.assign(root));
        }

        let returned = function
            .return_type
            .as_ref()
            .filter(|(_, returned_type)| !returned_type.is_void());
        if let Some((range, ty)) = returned {
            let result = VariableUsageState::new("result", *range, root, ty.clone());
            match function.kind {
                FunctionKind::Func => scope.set_result(result),
                FunctionKind::Hook(HookTime::After) => scope.set_result(result.assign(root)),
                FunctionKind::Hook(HookTime::Before) => {}
            }
        }
        scope
    }

    fn statement(&mut self, id: StmtId, frame: &mut Frame, scope: &mut ScopeTree) -> Result<(), FlowError> {
        let body = self.body;
        let statement = body.stmt(id);
        if scope.function.returned_value && !matches!(statement, Stmt::Block { .. }) {
            self.deducer.report(Message::warning(
                statement.range(),
                "This statement is unreachable, the function already returned",
            ));
        }

        match statement {
            Stmt::Block { statements, range } => self.block(statements, *range, scope)?,
            Stmt::LetAssign { name, value, .. } => {
                let ty = self.deducer.rvalue(*value, scope);
                self.declare(name, ty, true, frame, scope);
            }
            Stmt::LetWithType { name, ty, .. } => {
                let resolved = self.deducer.resolve_type(&name.name, ty);
                self.declare(name, resolved, false, frame, scope);
            }
            Stmt::Assign { target, value, .. } => {
                let value_type = self.deducer.rvalue(*value, scope);
                if let Some(target_type) = self.deducer.lvalue(*target, frame.range, scope) {
                    self.deducer
                        .downcast(body.expr(*value).range(), &value_type, &target_type);
                }
            }
            Stmt::Evaluate { expr, .. } => {
                self.deducer.rvalue(*expr, scope);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                range,
            } => {
                self.condition(*condition, scope);
                let mut taken = scope.clone();
                self.branch(*then_branch, &mut taken)?;
                let mut branches = vec![(body.stmt(*then_branch).range(), taken)];
                if let Some(else_branch) = else_branch {
                    let mut otherwise = scope.clone();
                    self.branch(*else_branch, &mut otherwise)?;
                    branches.push((body.stmt(*else_branch).range(), otherwise));
                } else {
                    branches.push((*range, scope.clone()));
                }
                *scope = ScopeTree::parallel(&branches)?;
            }
            Stmt::While {
                condition,
                body: loop_body,
                range,
            } => {
                self.condition(*condition, scope);
                let was_in_loop = scope.function.in_loop;
                let mut looped = scope.clone();
                looped.function.in_loop = true;
                self.branch(*loop_body, &mut looped)?;
                *scope = ScopeTree::parallel(&[
                    (body.stmt(*loop_body).range(), looped),
                    (*range, scope.clone()),
                ])?;
                scope.function.in_loop = was_in_loop;
            }
            Stmt::Return { value, range } => self.ret(*value, *range, frame, scope),
            Stmt::Break { range } => self.loop_control("break", *range, scope),
            Stmt::Continue { range } => self.loop_control("continue", *range, scope),
        }
        Ok(())
    }

    fn block(&mut self, statements: &[StmtId], range: Range, scope: &mut ScopeTree) -> Result<(), FlowError> {
        let mut frame = Frame::new(range);
        for statement in statements {
            self.statement(*statement, &mut frame, scope)?;
        }

        for name in &frame.declared {
            if let Some(warning) = scope.remove(name).and_then(|state| state.closing_warning()) {
                self.deducer.report(warning);
            }
        }
        for outer in frame.shadowed {
            scope.insert(outer);
        }
        Ok(())
    }

    /// Walk a branch of an `if` or a loop body in its own block
    fn branch(&mut self, id: StmtId, scope: &mut ScopeTree) -> Result<(), FlowError> {
        let body = self.body;
        match body.stmt(id) {
            Stmt::Block { statements, range } => self.block(statements, *range, scope),
            other => self.block(&[id], other.range(), scope),
        }
    }

    fn condition(&mut self, condition: ExprId, scope: &mut ScopeTree) {
        let ty = self.deducer.rvalue(condition, scope);
        self.deducer
            .downcast(self.body.expr(condition).range(), &ty, &VariableType::BOOL);
    }

    fn declare(
        &mut self,
        name: &Ident,
        ty: VariableType,
        assigned: bool,
        frame: &mut Frame,
        scope: &mut ScopeTree,
    ) {
        if frame.declared.contains(&name.name) {
            let mut message = Message::error(
                name.range,
                format!("Name {name} was declared twice in the same block"),
            );
            if let Some(previous) = scope.get(&name.name) {
                message = message.with_related(
                    self.deducer.location(previous.definition),
                    "Previously declared here",
                );
            }
            self.deducer.report(message);
            return;
        }

        let declared = VariableUsageState::new(name.name.clone(), name.range, frame.range, ty);
        let state = if assigned {
            declared.assign(frame.range)
        } else {
            declared
        };
        self.deducer.bind_local(name.range, &state);
        if let Some(outer) = scope.insert(state) {
            frame.shadowed.push(outer);
        }
        frame.declared.push(name.name.clone());
    }

    fn ret(&mut self, value: Option<ExprId>, range: Range, frame: &Frame, scope: &mut ScopeTree) {
        let function = self.function;
        let returned = value.map(|expr| (self.body.expr(expr).range(), self.deducer.rvalue(expr, scope)));

        if function.is_before_hook() {
            self.deducer.report(Message::error(
                range,
                "'return' statements are forbidden in 'before' hooks",
            ));
        } else {
            match (function.returned_type(), returned) {
                (None, Some(_)) => self.deducer.report(Message::error(
                    range,
                    "This function is not supposed to return any value",
                )),
                (Some(expected), None) => {
                    if function.kind == FunctionKind::Func {
                        self.deducer.report(Message::error(
                            range,
                            format!(
                                "This function is supposed to return an expression of type \
                                 {expected}, but no return value was supplied"
                            ),
                        ));
                    }
                }
                (Some(expected), Some((value_range, ty))) => {
                    self.deducer.downcast(value_range, &ty, expected);
                    if let Some(result) = scope.result() {
                        let assigned = result.assign(frame.range);
                        scope.set_result(assigned);
                    }
                }
                (None, None) => {}
            }
        }
        scope.function.returned_value = true;
    }

    fn loop_control(&mut self, keyword: &str, range: Range, scope: &ScopeTree) {
        if !scope.function.in_loop {
            self.deducer.report(Message::error(
                range,
                format!("'{keyword}' statement was not in a loop"),
            ));
        }
    }

    /// A function with a return type must assign `result` on every path
    fn check_returned(&mut self, scope: &ScopeTree) {
        let function = self.function;
        if function.kind != FunctionKind::Func {
            return;
        }
        let (Some((range, _)), Some(result)) = (&function.return_type, scope.result()) else {
            return;
        };
        if result.is_never_assigned() {
            self.deducer.report(Message::error(
                *range,
                "A value was not returned at the end of this function",
            ));
        } else if result.is_conditionally_assigned() {
            self.deducer.report(Message::error(
                *range,
                format!(
                    "A value was not returned at the end of this function on all paths{}",
                    missing_blocks(&result.not_assigned)
                ),
            ));
        }
    }
}
