//! Definite-assignment dataflow analysis for QSS function bodies
//!
//! [`VariableTracker`] walks a body's statement tree top-down, threading a [`ScopeTree`] that
//! holds the [`VariableUsageState`] of every visible variable. Branches are walked in copies of
//! the scope and merged with [`ScopeTree::parallel`], so a variable counts as assigned after an
//! `if` only if every branch assigned it. Expression types are deduced on the way and recorded in
//! a side table keyed by expression ID; the AST itself is never modified.

mod deduce;
mod error;
mod function;
mod scope;
mod state;
mod tracker;

pub use deduce::ExprTypes;
pub use error::FlowError;
pub use function::{FlowFunction, FunctionKind};
pub use scope::{FunctionState, ScopeTree};
pub use state::{VariableUsageState, missing_blocks};
pub use tracker::{FlowOutcome, VariableTracker};

#[cfg(test)]
mod tests {
    use super::*;
    use qss_ast::{
        BinaryOp, Body, BodyBuilder, Expr, ExprId, Func, FuncBody, HookTime, Ident, Import, Literal,
        MaybeOp, Name, Script, Signature, Stmt, StmtId, THIS, TypeExpr, UnaryOp,
    };
    use qss_diagnostics::Severity;
    use qss_index::{DEFAULT_BUNDLE, Index, Indices};
    use qss_name::ScriptPath;
    use qss_resolve::Resolver;
    use qss_span::{Location, Position, Range};
    use qss_types::{Primitive, Purity, VariableType};

    fn at(line: u32) -> Range {
        Range::new(Position::new(line, 4), Position::new(line, 12))
    }

    fn span(first: u32, last: u32) -> Range {
        Range::new(Position::new(first, 0), Position::new(last, 1))
    }

    /// Builds a body line by line
    #[derive(Default)]
    struct Source {
        builder: BodyBuilder,
    }

    impl Source {
        fn int(&mut self, value: i64, line: u32) -> ExprId {
            self.builder.expr(Expr::Literal {
                value: Literal::Int(value),
                range: at(line),
            })
        }

        fn truth(&mut self, line: u32) -> ExprId {
            self.builder.expr(Expr::Literal {
                value: Literal::Bool(true),
                range: at(line),
            })
        }

        fn text(&mut self, line: u32) -> ExprId {
            self.builder.expr(Expr::Literal {
                value: Literal::String("a".to_owned()),
                range: at(line),
            })
        }

        fn name(&mut self, name: &str, line: u32) -> ExprId {
            self.builder.expr(Expr::Identifier {
                name: Name::parse(name, at(line)),
            })
        }

        fn result(&mut self, line: u32) -> ExprId {
            self.builder.expr(Expr::Result { range: at(line) })
        }

        fn call(&mut self, name: &str, line: u32) -> ExprId {
            let function = self.name(name, line);
            self.builder.expr(Expr::Call {
                function,
                args: Vec::new(),
                receiver_style: false,
                range: at(line),
            })
        }

        fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, line: u32) -> ExprId {
            self.builder.expr(Expr::Binary {
                op,
                lhs,
                rhs,
                range: at(line),
            })
        }

        fn this(&mut self, line: u32) -> ExprId {
            self.builder.expr(Expr::This { range: at(line) })
        }

        fn index(&mut self, container: ExprId, index: ExprId, line: u32) -> ExprId {
            self.builder.expr(Expr::Index {
                container,
                index,
                range: at(line),
            })
        }

        fn negate(&mut self, operand: ExprId, line: u32) -> ExprId {
            self.builder.expr(Expr::Unary {
                op: UnaryOp::Negate,
                operand,
                range: at(line),
            })
        }

        fn maybe(&mut self, op: MaybeOp, operand: ExprId, line: u32) -> ExprId {
            self.builder.expr(Expr::Maybe {
                op,
                operand,
                range: at(line),
            })
        }

        fn let_typed(&mut self, name: &str, line: u32) -> StmtId {
            self.builder.stmt(Stmt::LetWithType {
                name: Ident::new(name, at(line)),
                ty: TypeExpr::primitive(Primitive::Int, at(line)),
                range: at(line),
            })
        }

        fn let_value(&mut self, name: &str, value: ExprId, line: u32) -> StmtId {
            self.builder.stmt(Stmt::LetAssign {
                name: Ident::new(name, at(line)),
                value,
                range: at(line),
            })
        }

        fn assign(&mut self, name: &str, value: ExprId, line: u32) -> StmtId {
            let target = self.name(name, line);
            self.builder.stmt(Stmt::Assign {
                target,
                value,
                range: at(line),
            })
        }

        fn eval(&mut self, expr: ExprId, line: u32) -> StmtId {
            self.builder.stmt(Stmt::Evaluate {
                expr,
                range: at(line),
            })
        }

        fn ret(&mut self, value: Option<ExprId>, line: u32) -> StmtId {
            self.builder.stmt(Stmt::Return {
                value,
                range: at(line),
            })
        }

        fn brk(&mut self, line: u32) -> StmtId {
            self.builder.stmt(Stmt::Break { range: at(line) })
        }

        fn if_then(&mut self, then_branch: StmtId, first: u32, last: u32) -> StmtId {
            let condition = self.truth(first);
            self.builder.stmt(Stmt::If {
                condition,
                then_branch,
                else_branch: None,
                range: span(first, last),
            })
        }

        fn while_loop(&mut self, body: StmtId, first: u32, last: u32) -> StmtId {
            let condition = self.truth(first);
            self.builder.stmt(Stmt::While {
                condition,
                body,
                range: span(first, last),
            })
        }

        fn block(&mut self, statements: Vec<StmtId>, first: u32, last: u32) -> StmtId {
            self.builder.stmt(Stmt::Block {
                statements,
                range: span(first, last),
            })
        }

        fn finish(self, root: StmtId) -> Body {
            self.builder.finish(root)
        }
    }

    fn function(body: &Body, kind: FunctionKind, return_type: Option<VariableType>) -> FlowFunction<'_> {
        FlowFunction {
            kind,
            params: Vec::new(),
            return_type: return_type.map(|ty| (at(0), ty)),
            purity: Purity::Impure,
            this_type: None,
            body,
        }
    }

    fn main_script() -> Script {
        let mut script = Script::new(ScriptPath::parse("src/main/main.qss"), "main".parse().unwrap());
        script.imports.push(Import {
            package: "lib".parse().unwrap(),
            range: Range::default(),
        });
        script
    }

    fn track_in(indices: &Indices, function: &FlowFunction<'_>) -> FlowOutcome {
        let resolver = Resolver::new(indices);
        let script = main_script();
        VariableTracker::new(&resolver, &script).track(function).unwrap()
    }

    fn track(function: &FlowFunction<'_>) -> FlowOutcome {
        track_in(&Indices::new(), function)
    }

    fn texts(outcome: &FlowOutcome) -> Vec<&str> {
        outcome
            .messages
            .iter()
            .map(|message| message.message.as_str())
            .collect()
    }

    /// Package `lib` with an impure `shout` and a pure `double`
    fn library() -> Indices {
        let indices = Indices::new();
        let mut source = Script::new(ScriptPath::parse("src/lib/lib.qss"), "lib".parse().unwrap());
        for (line, (name, purity)) in [("shout", Purity::Impure), ("double", Purity::Pure)]
            .into_iter()
            .enumerate()
        {
            source.funcs.push(Func {
                name: Ident::new(name, at(line as u32)),
                documentation: None,
                signature: Signature {
                    purity,
                    receiver_style: false,
                    params: Vec::new(),
                    return_type: None,
                },
                body: FuncBody::Native,
                range: at(line as u32),
            });
        }
        let bundle = indices.bundle_or_insert(DEFAULT_BUNDLE, "/project");
        let mut shallow = Index::new(source.package.clone());
        assert!(shallow.add_names(&source).is_empty());
        assert!(bundle.insert(shallow).is_none());

        let mut deep = Index::clone(&bundle.get(&source.package).unwrap());
        assert!(deep.add_types(&source, &Resolver::new(&indices)).is_empty());
        assert!(bundle.insert(deep).is_some());
        indices
    }

    #[test]
    fn test_unconditional_assignment_passes() {
        let mut source = Source::default();
        let declare = source.let_typed("a", 1);
        let one = source.int(1, 2);
        let assign = source.assign("a", one, 2);
        let read = source.name("a", 3);
        let use_a = source.eval(read, 3);
        let root = source.block(vec![declare, assign, use_a], 0, 4);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert!(outcome.messages.is_empty(), "{:?}", outcome.messages);
        assert_eq!(outcome.types.get(read), Some(&VariableType::INT));
    }

    #[test]
    fn test_conditional_assignment_names_the_missing_branch() {
        let mut source = Source::default();
        let declare = source.let_typed("a", 1);
        let one = source.int(1, 3);
        let assign = source.assign("a", one, 3);
        let then_block = source.block(vec![assign], 2, 4);
        let branch = source.if_then(then_block, 2, 4);
        let read = source.name("a", 5);
        let use_a = source.eval(read, 5);
        let root = source.block(vec![declare, branch, use_a], 0, 6);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(
            texts(&outcome),
            ["Variable a was not assigned on all paths before use. You must assign the variable in \
              the following blocks: lines 3-5"]
        );
        assert_eq!(outcome.messages[0].range, at(5));
        assert_eq!(outcome.messages[0].severity, Severity::Error);
    }

    #[test]
    fn test_read_before_any_assignment() {
        let mut source = Source::default();
        let declare = source.let_typed("a", 1);
        let read = source.name("a", 2);
        let use_a = source.eval(read, 2);
        let root = source.block(vec![declare, use_a], 0, 3);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&outcome), ["Variable a was not assigned before use"]);
    }

    #[test]
    fn test_redeclaration_points_at_first_declaration() {
        let mut source = Source::default();
        let one = source.int(1, 1);
        let first = source.let_value("x", one, 1);
        let two = source.int(2, 2);
        let second = source.let_value("x", two, 2);
        let read = source.name("x", 3);
        let use_x = source.eval(read, 3);
        let root = source.block(vec![first, second, use_x], 0, 4);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&outcome), ["Name x was declared twice in the same block"]);
        let message = &outcome.messages[0];
        assert_eq!(message.range, at(2));
        assert_eq!(message.related.len(), 1);
        assert_eq!(
            message.related[0].location,
            Location::new(ScriptPath::parse("src/main/main.qss"), at(1))
        );
        assert_eq!(message.related[0].message, "Previously declared here");
    }

    #[test]
    fn test_shadowing_an_outer_block_is_allowed() {
        let mut source = Source::default();
        let one = source.int(1, 1);
        let outer = source.let_value("x", one, 1);
        let two = source.int(2, 3);
        let inner = source.let_value("x", two, 3);
        let inner_read = source.name("x", 4);
        let use_inner = source.eval(inner_read, 4);
        let nested = source.block(vec![inner, use_inner], 2, 5);
        let outer_read = source.name("x", 6);
        let use_outer = source.eval(outer_read, 6);
        let root = source.block(vec![outer, nested, use_outer], 0, 7);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert!(outcome.messages.is_empty(), "{:?}", outcome.messages);
    }

    #[test]
    fn test_unused_variables_warn_once_when_the_block_closes() {
        let mut source = Source::default();
        let one = source.int(1, 1);
        let unused = source.let_value("x", one, 1);
        let unassigned = source.let_typed("y", 2);
        let root = source.block(vec![unused, unassigned], 0, 3);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(
            texts(&outcome),
            ["Variable x was never used", "Variable y was never assigned"]
        );
        assert!(outcome
            .messages
            .iter()
            .all(|message| message.severity == Severity::Warning));
        assert_eq!(outcome.messages[0].range, at(1));
    }

    #[test]
    fn test_impure_call_rejected_inside_pure_function() {
        let indices = library();
        let mut source = Source::default();
        let shout = source.call("shout", 1);
        let call_shout = source.eval(shout, 1);
        let root = source.block(vec![call_shout], 0, 2);
        let body = source.finish(root);

        let mut pure = function(&body, FunctionKind::Func, None);
        pure.purity = Purity::Pure;
        let outcome = track_in(&indices, &pure);
        assert_eq!(
            texts(&outcome),
            ["Cannot execute function of purity impure inside function of purity pure"]
        );
        assert_eq!(outcome.messages[0].range, at(1));
    }

    #[test]
    fn test_pure_call_accepted_anywhere() {
        let indices = library();
        let mut source = Source::default();
        let double = source.call("double", 1);
        let call_double = source.eval(double, 1);
        let root = source.block(vec![call_double], 0, 2);
        let body = source.finish(root);

        for purity in [Purity::Eager, Purity::Ui, Purity::Pure, Purity::Impure] {
            let mut caller = function(&body, FunctionKind::Func, None);
            caller.purity = purity;
            let outcome = track_in(&indices, &caller);
            assert!(outcome.messages.is_empty(), "{purity}: {:?}", outcome.messages);
            assert_eq!(outcome.types.get(double), Some(&VariableType::VOID));
        }
    }

    #[test]
    fn test_value_must_be_returned_on_all_paths() {
        let mut source = Source::default();
        let one = source.int(1, 2);
        let early = source.ret(Some(one), 2);
        let then_block = source.block(vec![early], 1, 3);
        let branch = source.if_then(then_block, 1, 3);
        let root = source.block(vec![branch], 0, 4);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, Some(VariableType::INT)));
        assert_eq!(
            texts(&outcome),
            ["A value was not returned at the end of this function on all paths. You must assign \
              the variable in the following blocks: lines 2-4"]
        );
        assert_eq!(outcome.messages[0].range, at(0));

        let mut empty = Source::default();
        let root = empty.block(Vec::new(), 0, 1);
        let empty_body = empty.finish(root);
        let missing = track(&function(&empty_body, FunctionKind::Func, Some(VariableType::INT)));
        assert_eq!(texts(&missing), ["A value was not returned at the end of this function"]);
    }

    #[test]
    fn test_return_value_must_match() {
        let mut source = Source::default();
        let text = source.text(1);
        let wrong = source.ret(Some(text), 1);
        let root = source.block(vec![wrong], 0, 2);
        let body = source.finish(root);

        let typed = track(&function(&body, FunctionKind::Func, Some(VariableType::INT)));
        assert_eq!(texts(&typed), ["Expected an expression of type Int, got String"]);

        let untyped = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&untyped), ["This function is not supposed to return any value"]);
    }

    #[test]
    fn test_unreachable_code_and_loop_control() {
        let mut source = Source::default();
        let done = source.ret(None, 1);
        let stray = source.brk(2);
        let root = source.block(vec![done, stray], 0, 3);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(
            texts(&outcome),
            [
                "This statement is unreachable, the function already returned",
                "'break' statement was not in a loop",
            ]
        );
        assert_eq!(outcome.messages[0].severity, Severity::Warning);

        let mut looping = Source::default();
        let exit = looping.brk(2);
        let loop_body = looping.block(vec![exit], 1, 3);
        let repeat = looping.while_loop(loop_body, 1, 3);
        let root = looping.block(vec![repeat], 0, 4);
        let loop_fn = looping.finish(root);
        assert!(track(&function(&loop_fn, FunctionKind::Func, None)).messages.is_empty());
    }

    #[test]
    fn test_result_availability() {
        let mut source = Source::default();
        let result = source.result(1);
        let copy = source.let_value("copy", result, 1);
        let read = source.name("copy", 2);
        let use_copy = source.eval(read, 2);
        let root = source.block(vec![copy, use_copy], 0, 3);
        let body = source.finish(root);

        let after = track(&function(&body, FunctionKind::Hook(HookTime::After), Some(VariableType::INT)));
        assert!(after.messages.is_empty(), "{:?}", after.messages);
        assert_eq!(after.types.get(result), Some(&VariableType::INT));

        let plain = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&plain), ["The 'result' variable is not available in functions"]);

        let before = track(&function(&body, FunctionKind::Hook(HookTime::Before), None));
        assert_eq!(
            texts(&before),
            ["The 'result' variable is not available in 'before' hooks"]
        );

        let void_after = track(&function(&body, FunctionKind::Hook(HookTime::After), None));
        assert_eq!(
            texts(&void_after),
            ["This function doesn't return a value, so the 'result' variable is not available"]
        );
    }

    #[test]
    fn test_before_hooks_may_not_return() {
        let mut source = Source::default();
        let done = source.ret(None, 1);
        let root = source.block(vec![done], 0, 2);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Hook(HookTime::Before), None));
        assert_eq!(texts(&outcome), ["'return' statements are forbidden in 'before' hooks"]);
    }

    #[test]
    fn test_duplicate_parameters() {
        let mut source = Source::default();
        let read = source.name("a", 1);
        let use_a = source.eval(read, 1);
        let root = source.block(vec![use_a], 0, 2);
        let body = source.finish(root);
        let first = Ident::new("a", at(0));
        let second = Ident::new("a", span(0, 0));

        let mut with_params = function(&body, FunctionKind::Func, None);
        with_params.params = vec![(&first, VariableType::INT), (&second, VariableType::INT)];
        let outcome = track(&with_params);
        assert_eq!(texts(&outcome), ["Parameter a was already defined"]);
        assert_eq!(outcome.messages[0].related[0].message, "Previously defined here");
        assert_eq!(outcome.types.get(read), Some(&VariableType::INT));
    }

    #[test]
    fn test_misspelt_name_suggests_local() {
        let mut source = Source::default();
        let one = source.int(1, 1);
        let declare = source.let_value("count", one, 1);
        let read = source.name("count", 2);
        let use_count = source.eval(read, 2);
        let typo = source.name("cuont", 3);
        let use_typo = source.eval(typo, 3);
        let root = source.block(vec![declare, use_count, use_typo], 0, 4);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&outcome), ["Could not resolve name cuont"]);
        assert_eq!(outcome.messages[0].related[0].message, "Did you mean count?");
        assert_eq!(outcome.types.get(typo), Some(&VariableType::UNKNOWN));
    }

    #[test]
    fn test_arithmetic_types() {
        let mut source = Source::default();
        let one = source.int(1, 1);
        let two = source.int(2, 1);
        let division = source.binary(BinaryOp::Divide, one, two, 1);
        let half = source.let_value("half", division, 1);
        let read_half = source.name("half", 2);
        let use_half = source.eval(read_half, 2);
        let three = source.int(3, 3);
        let text = source.text(3);
        let addition = source.binary(BinaryOp::Add, three, text, 3);
        let total = source.let_value("total", addition, 3);
        let read_total = source.name("total", 4);
        let use_total = source.eval(read_total, 4);
        let root = source.block(vec![half, use_half, total, use_total], 0, 5);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(outcome.types.get(division), Some(&VariableType::RATIO));
        assert_eq!(
            texts(&outcome),
            ["Expected right hand side of type Int or Ratio in addition expression, got String"]
        );
        assert_eq!(
            outcome.messages[0].related[0].message,
            "Required because the left hand side of this expression is of type Int"
        );
        assert_eq!(outcome.types.get(addition), Some(&VariableType::UNKNOWN));
    }

    #[test]
    fn test_maybe_operators() {
        let mut source = Source::default();
        let one = source.int(1, 1);
        let wrapped = source.maybe(MaybeOp::Just, one, 1);
        let declare = source.let_value("value", wrapped, 1);
        let read = source.name("value", 2);
        let unwrapped = source.maybe(MaybeOp::Get, read, 2);
        let use_value = source.eval(unwrapped, 2);
        let plain = source.int(1, 3);
        let exists = source.maybe(MaybeOp::Exists, plain, 3);
        let use_plain = source.eval(exists, 3);
        let root = source.block(vec![declare, use_value, use_plain], 0, 4);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(outcome.types.get(unwrapped), Some(&VariableType::INT));
        assert_eq!(outcome.types.get(exists), Some(&VariableType::BOOL));
        assert_eq!(texts(&outcome), ["Expected a 'maybe' expression, got Int"]);
    }

    #[test]
    fn test_this_reads_the_receiver() {
        let mut source = Source::default();
        let this = source.this(1);
        let use_this = source.eval(this, 1);
        let root = source.block(vec![use_this], 0, 2);
        let body = source.finish(root);
        let receiver = Ident::new(THIS, at(0));

        let mut method = function(&body, FunctionKind::Func, None);
        method.params = vec![(&receiver, VariableType::INT)];
        let outcome = track(&method);
        assert!(outcome.messages.is_empty(), "{:?}", outcome.messages);
        assert_eq!(outcome.types.get(this), Some(&VariableType::INT));

        let without_receiver = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&without_receiver), ["The 'this' variable is not available here"]);
        assert_eq!(without_receiver.types.get(this), Some(&VariableType::UNKNOWN));
    }

    #[test]
    fn test_index_into_lists_and_maps() {
        let mut source = Source::default();
        let list = source.name("list", 1);
        let position = source.int(1, 1);
        let element = source.index(list, position, 1);
        let use_element = source.eval(element, 1);
        let map = source.name("map", 2);
        let key = source.text(2);
        let value = source.index(map, key, 2);
        let use_value = source.eval(value, 2);
        let map_again = source.name("map", 3);
        let wrong_key = source.int(1, 3);
        let mistyped = source.index(map_again, wrong_key, 3);
        let use_mistyped = source.eval(mistyped, 3);
        let number = source.int(5, 4);
        let zero = source.int(0, 4);
        let not_a_container = source.index(number, zero, 4);
        let use_number = source.eval(not_a_container, 4);
        let root = source.block(vec![use_element, use_value, use_mistyped, use_number], 0, 5);
        let body = source.finish(root);
        let list_param = Ident::new("list", at(0));
        let map_param = Ident::new("map", at(0));

        let mut indexing = function(&body, FunctionKind::Func, None);
        indexing.params = vec![
            (&list_param, VariableType::list(VariableType::INT)),
            (&map_param, VariableType::map(VariableType::STRING, VariableType::RATIO)),
        ];
        let outcome = track(&indexing);
        assert_eq!(
            texts(&outcome),
            [
                "Expected an expression of type String, got Int",
                "Expected a list or map, got expression of type Int",
            ]
        );
        assert_eq!(outcome.messages[0].range, at(3));
        assert_eq!(outcome.types.get(element), Some(&VariableType::maybe(VariableType::INT)));
        assert_eq!(outcome.types.get(value), Some(&VariableType::maybe(VariableType::RATIO)));
        assert_eq!(outcome.types.get(not_a_container), Some(&VariableType::UNKNOWN));
    }

    #[test]
    fn test_negating_a_non_number_does_not_cascade() {
        let mut source = Source::default();
        let text = source.text(1);
        let negated = source.negate(text, 1);
        let declare = source.let_value("b", negated, 1);
        let read = source.name("b", 2);
        let one = source.int(1, 2);
        let sum = source.binary(BinaryOp::Add, read, one, 2);
        let total = source.let_value("c", sum, 2);
        let read_total = source.name("c", 3);
        let use_total = source.eval(read_total, 3);
        let root = source.block(vec![declare, total, use_total], 0, 4);
        let body = source.finish(root);

        let outcome = track(&function(&body, FunctionKind::Func, None));
        assert_eq!(texts(&outcome), ["Expected an expression of type Int or Ratio, got String"]);
        assert_eq!(outcome.types.get(negated), Some(&VariableType::UNKNOWN));
        assert_eq!(outcome.types.get(sum), Some(&VariableType::UNKNOWN));
    }
}
