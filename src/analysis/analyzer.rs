//! The semantic analyzer: a single-pass statement visitor
//!
//! Walks a parsed translation unit, validates it against the language's
//! static semantics, and lowers each function into IR. Compound statements
//! are built through an explicit aggregator stack: entering an `if`/loop body
//! pushes a fresh instruction frame, and the finished block is attached to
//! the frame below on exit.

use super::MAX_FUNCTION_PARAMS;
use super::symbol_table::SymbolTable;
use super::types::DataType;
use crate::codegen::FunctionSink;
use crate::errors::{InternalReport, Level, RillcError, RillcResult, SemanticReport};
use crate::ir::{
    Expression, ExprItem, ForBlock, IfBlock, Instruction, IrFunction, Variable, WhileBlock,
};
use crate::parser::{
    AssignmentStmt, BreakStmt, CallStmt, ContinueStmt, ForStmt, FunctionDef, IfStmt,
    NamedLoopStmt, ReassignmentStmt, ReturnStmt, Statement, TranslationUnit, WhileStmt,
};
use crate::parser::{Ast, IfKind};
use crate::preprocessor::SourceMap;

/// Continue/break sites recorded while a loop body is under construction
#[derive(Debug, Default)]
struct LoopSites {
    continues: usize,
    breaks: Vec<String>,
}

/// The function currently being lowered
#[derive(Debug, Clone)]
struct FnRecord {
    name: String,
    return_type: DataType,
}

/// The analyzer/IR builder
pub struct Analyzer<'a> {
    pub(super) symbols: SymbolTable,
    pub(super) source: &'a SourceMap,

    /// Aggregator stack: the top frame receives new instructions
    frames: Vec<Vec<Instruction>>,
    /// Loop frames for loops under construction
    loops: Vec<LoopSites>,
    /// Nearest enclosing loop accepting `continue`, as an index into `loops`
    continuable: Option<usize>,
    /// Nearest enclosing *named* loop accepting `break`
    breakable: Option<usize>,

    current_function: Option<FnRecord>,
    /// Function watcher: an explicit top-level return was seen
    has_return: bool,
    /// Program watcher: a `main` function was seen
    has_main: bool,

    /// Scratch postfix buffer reused across expression builds
    pub(super) pending: Vec<ExprItem>,
    /// Diagnostics that were safe to continue past
    errors: Vec<RillcError>,
}

impl<'a> Analyzer<'a> {
    pub fn new(source: &'a SourceMap) -> Self {
        Self {
            symbols: SymbolTable::new(),
            source,
            frames: Vec::new(),
            loops: Vec::new(),
            continuable: None,
            breakable: None,
            current_function: None,
            has_return: false,
            has_main: false,
            pending: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Analyze a whole translation unit, feeding completed functions to the
    /// sink in source-declaration order.
    pub fn run(mut self, unit: TranslationUnit, sink: &mut dyn FunctionSink) -> RillcResult<()> {
        for function in unit.functions {
            if let Err(e) = self.visit_function(function, sink) {
                self.errors.push(e);
                return Err(self.errors.remove(0));
            }
        }

        if !self.has_main {
            self.errors.push(RillcError::Semantic(SemanticReport {
                level: Level::Fatal,
                file: self.source.file_for(1),
                user_line: 0,
                line: 1,
                line_text: String::new(),
                messages: vec!["No 'main' function found".to_string()],
            }));
        }

        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        Ok(())
    }

    // ==================== Diagnostics ====================

    pub(super) fn semantic_error(&self, line: usize, messages: Vec<String>) -> RillcError {
        RillcError::Semantic(SemanticReport {
            level: Level::Error,
            file: self.source.file_for(line),
            user_line: self.source.user_line_number(line),
            line,
            line_text: self.source.line_text(line),
            messages,
        })
    }

    pub(super) fn internal_error(
        &self,
        function: &'static str,
        messages: Vec<String>,
    ) -> RillcError {
        RillcError::Internal(InternalReport {
            component: "analysis::Analyzer",
            file: "analyzer.rs",
            function,
            messages,
        })
    }

    pub(super) fn current_function_name(&self) -> Option<&str> {
        self.current_function.as_ref().map(|f| f.name.as_str())
    }

    // ==================== Aggregators ====================

    fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    fn pop_frame(&mut self, function: &'static str) -> RillcResult<Vec<Instruction>> {
        match self.frames.pop() {
            Some(frame) => Ok(frame),
            None => Err(self.internal_error(
                function,
                vec!["aggregator stack was empty when a frame was expected".to_string()],
            )),
        }
    }

    fn emit(&mut self, instruction: Instruction) -> RillcResult<()> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.push(instruction);
                Ok(())
            }
            None => Err(self.internal_error(
                "emit",
                vec!["instruction emitted with no active aggregator".to_string()],
            )),
        }
    }

    // ==================== Functions ====================

    fn visit_function(
        &mut self,
        function: FunctionDef,
        sink: &mut dyn FunctionSink,
    ) -> RillcResult<()> {
        // Ensure function name doesn't exist
        if self.symbols.does_context_exist(&function.name) {
            return Err(self.semantic_error(
                function.line,
                vec![
                    format!("Duplicate context name ({}) detected", function.name),
                    "Rename function to be unique".to_string(),
                ],
            ));
        }

        self.symbols
            .new_context(&function.name)
            .map_err(|e| self.internal_error("visit_function", vec![e]))?;

        if function.name == "main" {
            self.has_main = true;
        }

        // Hard cap on parameter count; analysis continues past this one
        if function.params.len() > MAX_FUNCTION_PARAMS {
            let report = self.semantic_error(
                function.line,
                vec![
                    format!(
                        "Function parameters exceed number permitted by system ({})",
                        MAX_FUNCTION_PARAMS
                    ),
                    "Reduce the number of parameters for the given function".to_string(),
                ],
            );
            self.errors.push(report);
        }

        let params = function.params.clone();
        self.symbols
            .add_parameters_to_current_context(function.params)
            .map_err(|e| self.semantic_error(function.line, vec![e]))?;
        self.symbols
            .add_return_type_to_current_context(function.return_type);

        self.has_return = false;
        self.current_function = Some(FnRecord {
            name: function.name.clone(),
            return_type: function.return_type,
        });
        self.push_frame();

        for element in function.body {
            self.visit_statement(element)?;
        }

        // Clear symbols so they can't be reached externally; the signature
        // record stays behind for later call resolution
        self.symbols.clear_existing_context(&function.name);

        if !self.has_return {
            let report = self.semantic_error(
                function.line,
                vec![
                    "Given function does not have a matching return. All functions must be \
                     explicitly returned"
                        .to_string(),
                ],
            );
            self.errors.push(report);
        }

        let body = self.pop_frame("visit_function")?;
        sink.add_ready_function(IrFunction {
            name: function.name,
            return_type: function.return_type,
            params,
            body,
            frame: self.symbols.frame_snapshot(),
        });

        self.current_function = None;
        self.symbols.reset_memory();
        Ok(())
    }

    // ==================== Statements ====================

    fn visit_statement(&mut self, statement: Statement) -> RillcResult<()> {
        match statement {
            Statement::Assignment(stmt) => self.visit_assignment(stmt),
            Statement::Reassignment(stmt) => self.visit_reassignment(stmt),
            Statement::Call(stmt) => self.visit_call(stmt),
            Statement::Return(stmt) => self.visit_return(stmt),
            Statement::If(stmt) => {
                let block = self.visit_if(stmt)?;
                self.emit(Instruction::If(block))
            }
            Statement::While(stmt) => self.visit_while(stmt),
            Statement::For(stmt) => self.visit_for(*stmt),
            Statement::NamedLoop(stmt) => self.visit_named_loop(stmt),
            Statement::Continue(stmt) => self.visit_continue(stmt),
            Statement::Break(stmt) => self.visit_break(stmt),
        }
    }

    fn visit_assignment(&mut self, stmt: AssignmentStmt) -> RillcResult<()> {
        if self.symbols.does_symbol_exist(&stmt.name) {
            return Err(self.semantic_error(
                stmt.line,
                vec![format!(
                    "Symbol \"{}\" used in assignment is not unique",
                    stmt.name
                )],
            ));
        }

        let mut expr = stmt.expr;
        self.pending.clear();
        self.build_expression(&stmt.name, &mut expr, stmt.data_type, stmt.line)?;
        let items = std::mem::take(&mut self.pending);

        self.emit(Instruction::Assignment {
            var: Variable::new(stmt.name.clone(), stmt.data_type),
            expr: Expression::new(stmt.data_type, items),
        })?;

        self.symbols
            .add_symbol(&stmt.name, stmt.data_type, stmt.immutable)
            .map_err(|e| self.semantic_error(stmt.line, vec![e]))
    }

    fn visit_reassignment(&mut self, stmt: ReassignmentStmt) -> RillcResult<()> {
        if !self.symbols.does_symbol_exist(&stmt.name) {
            return Err(self.semantic_error(
                stmt.line,
                vec![format!(
                    "Symbol \"{}\" for reassignment has not yet been defined",
                    stmt.name
                )],
            ));
        }

        if self.symbols.is_symbol_immutable(&stmt.name) {
            return Err(self.semantic_error(
                stmt.line,
                vec![format!(
                    "Reassignment of immutable symbol \"{}\"",
                    stmt.name
                )],
            ));
        }

        let lhs_type = self
            .symbols
            .get_value_type(&stmt.name)
            .expect("symbol existence checked above");

        let mut expr = stmt.expr;
        self.pending.clear();
        self.build_expression(&stmt.name, &mut expr, lhs_type, stmt.line)?;
        let items = std::mem::take(&mut self.pending);

        self.emit(Instruction::Reassignment {
            var: Variable::new(stmt.name, lhs_type),
            expr: Expression::new(lhs_type, items),
        })
    }

    fn visit_call(&mut self, stmt: CallStmt) -> RillcResult<()> {
        let mut call = stmt.call;
        self.validate_call(&mut call, stmt.line)?;

        self.emit(Instruction::Call {
            name: call.function_name,
            args: call.params,
        })
    }

    fn visit_return(&mut self, stmt: ReturnStmt) -> RillcResult<()> {
        // Only a return at the function's own level satisfies the watcher
        if !self.symbols.in_block_scope() {
            self.has_return = true;
        }

        let Some(current) = self.current_function.clone() else {
            return Err(self.internal_error(
                "visit_return",
                vec!["return visited outside of any function".to_string()],
            ));
        };

        match stmt.expr {
            Some(expr) => {
                if current.return_type == DataType::Nil {
                    return Err(self.semantic_error(
                        stmt.line,
                        vec![format!(
                            "Function \"{}\" returns nil but a value was given",
                            current.name
                        )],
                    ));
                }

                let mut expr = expr;
                self.pending.clear();
                self.build_expression(
                    "Return Expression",
                    &mut expr,
                    current.return_type,
                    stmt.line,
                )?;
                let items = std::mem::take(&mut self.pending);

                self.emit(Instruction::Return(Some(Expression::new(
                    current.return_type,
                    items,
                ))))
            }
            None => {
                if current.return_type != DataType::Nil {
                    return Err(self.semantic_error(
                        stmt.line,
                        vec![format!(
                            "Function \"{}\" must return a value of type {}",
                            current.name, current.return_type
                        )],
                    ));
                }
                self.emit(Instruction::Return(None))
            }
        }
    }

    fn visit_if(&mut self, stmt: IfStmt) -> RillcResult<IfBlock> {
        // The condition keeps whatever type its expression has; nonzero is
        // true, so no boolean kind is required
        let mut cond = stmt.cond;
        let cond_type = self.determine_expression_type(&mut cond, stmt.line)?;

        self.pending.clear();
        let label = match stmt.kind {
            IfKind::If => "If Statement",
            IfKind::Elif => "Else If Statement",
        };
        self.build_expression(label, &mut cond, cond_type, stmt.line)?;
        let items = std::mem::take(&mut self.pending);
        let cond_expr = Expression::new(cond_type, items);

        self.push_frame();
        self.symbols.push_scope();
        for element in stmt.body {
            self.visit_statement(element)?;
        }
        self.symbols.pop_scope();
        let body = self.pop_frame("visit_if")?;

        let trail = match stmt.trail {
            Some(next) => Some(Box::new(self.visit_if(*next)?)),
            None => None,
        };

        Ok(IfBlock {
            kind: stmt.kind,
            cond: cond_expr,
            body,
            trail,
        })
    }

    fn visit_while(&mut self, stmt: WhileStmt) -> RillcResult<()> {
        let mut cond = stmt.cond;
        let cond_type = self.determine_expression_type(&mut cond, stmt.line)?;

        self.pending.clear();
        self.build_expression("While Loop", &mut cond, cond_type, stmt.line)?;
        let items = std::mem::take(&mut self.pending);
        let cond_expr = Expression::new(cond_type, items);

        // A bare while accepts continue but is not breakable
        self.loops.push(LoopSites::default());
        let saved_continuable = self.continuable.replace(self.loops.len() - 1);

        self.push_frame();
        self.symbols.push_scope();
        for element in stmt.body {
            self.visit_statement(element)?;
        }
        self.symbols.pop_scope();
        let body = self.pop_frame("visit_while")?;

        self.continuable = saved_continuable;
        let sites = self.loops.pop().unwrap_or_default();

        self.emit(Instruction::While(WhileBlock {
            cond: cond_expr,
            body,
            continue_sites: sites.continues,
            break_sites: sites.breaks,
        }))
    }

    fn visit_for(&mut self, stmt: ForStmt) -> RillcResult<()> {
        // The loop variable lives in the enclosing scope
        self.visit_assignment(stmt.init)?;

        let mut cond = stmt.cond;
        let cond_type = self.determine_expression_type(&mut cond, stmt.line)?;

        self.pending.clear();
        self.build_expression("For Loop", &mut cond, cond_type, stmt.line)?;
        let items = std::mem::take(&mut self.pending);
        let cond_expr = Expression::new(cond_type, items);

        self.loops.push(LoopSites::default());
        let saved_continuable = self.continuable.replace(self.loops.len() - 1);

        self.push_frame();
        self.symbols.push_scope();
        for element in stmt.body {
            self.visit_statement(element)?;
        }

        // The step runs as the last body instruction of every iteration
        self.visit_reassignment(stmt.step)?;
        self.symbols.pop_scope();
        let mut body = self.pop_frame("visit_for")?;
        let step = match body.pop() {
            Some(instruction) => Box::new(instruction),
            None => {
                return Err(self.internal_error(
                    "visit_for",
                    vec!["for loop finished without a step instruction".to_string()],
                ));
            }
        };

        self.continuable = saved_continuable;
        let sites = self.loops.pop().unwrap_or_default();

        self.emit(Instruction::For(ForBlock {
            cond: cond_expr,
            body,
            step,
            continue_sites: sites.continues,
        }))
    }

    /// A named loop is a while loop over a synthesized counter:
    /// `loop name { .. }` becomes `name = 1; while (name) { .. }`
    fn visit_named_loop(&mut self, stmt: NamedLoopStmt) -> RillcResult<()> {
        self.visit_assignment(AssignmentStmt {
            name: stmt.name.clone(),
            data_type: DataType::Integer,
            immutable: false,
            expr: Box::new(Ast::value(DataType::Integer, "1")),
            line: stmt.line,
        })?;

        let mut cond = Ast::identifier(stmt.name.clone());
        self.pending.clear();
        self.build_expression("Named Loop", &mut cond, DataType::Integer, stmt.line)?;
        let items = std::mem::take(&mut self.pending);
        let cond_expr = Expression::new(DataType::Integer, items);

        // Named loops are both continuable and breakable
        self.loops.push(LoopSites::default());
        let index = self.loops.len() - 1;
        let saved_continuable = self.continuable.replace(index);
        let saved_breakable = self.breakable.replace(index);

        self.push_frame();
        self.symbols.push_scope();
        for element in stmt.body {
            self.visit_statement(element)?;
        }
        self.symbols.pop_scope();
        let body = self.pop_frame("visit_named_loop")?;

        self.continuable = saved_continuable;
        self.breakable = saved_breakable;
        let sites = self.loops.pop().unwrap_or_default();

        self.emit(Instruction::While(WhileBlock {
            cond: cond_expr,
            body,
            continue_sites: sites.continues,
            break_sites: sites.breaks,
        }))
    }

    fn visit_continue(&mut self, _stmt: ContinueStmt) -> RillcResult<()> {
        match self.continuable {
            Some(index) => {
                self.loops[index].continues += 1;
                self.emit(Instruction::Continue)
            }
            None => Err(self.internal_error(
                "visit_continue",
                vec![
                    "A continue statement came in and the continuable loop was not set".to_string(),
                    "This could either be a grammar error, or an implementation error in the \
                     analyzer"
                        .to_string(),
                ],
            )),
        }
    }

    fn visit_break(&mut self, stmt: BreakStmt) -> RillcResult<()> {
        match self.breakable {
            Some(index) => {
                self.loops[index].breaks.push(stmt.name.clone());
                self.emit(Instruction::Break { label: stmt.name })
            }
            None => Err(self.internal_error(
                "visit_break",
                vec![
                    "A break statement came in and the breakable loop was not set".to_string(),
                    "This could either be a grammar error, or an implementation error in the \
                     analyzer"
                        .to_string(),
                ],
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::codegen::IrCollector;
    use crate::parser::Parser;

    fn analyze_source(source: &str) -> RillcResult<Vec<IrFunction>> {
        let unit = Parser::new(source).parse()?;
        let map = SourceMap::from_source("test.rill", source);
        let mut collector = IrCollector::new();
        analyze(unit, &map, &mut collector)?;
        Ok(collector.into_functions())
    }

    #[test]
    fn test_minimal_main() {
        let functions = analyze_source("def main() -> int { return 0; }").unwrap();
        assert_eq!(functions.len(), 1);

        let main = &functions[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.body.len(), 1);

        let Instruction::Return(Some(expr)) = &main.body[0] else {
            panic!("expected a return with a value");
        };
        assert_eq!(expr.result_type, DataType::Integer);
        assert_eq!(expr.items, vec![ExprItem::Value("0".to_string())]);
    }

    #[test]
    fn test_functions_emitted_in_source_order_ending_in_return() {
        let functions = analyze_source(
            r#"
            def helper(a: int) -> int { return a; }
            def other() -> double { return 1.5; }
            def main() -> int { return 0; }
            "#,
        )
        .unwrap();

        let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["helper", "other", "main"]);
        for function in &functions {
            assert!(!function.body.is_empty());
            assert!(matches!(
                function.body.last(),
                Some(Instruction::Return(_))
            ));
        }
    }

    #[test]
    fn test_no_main_rejected() {
        let err = analyze_source("def f() -> int { return 0; }").unwrap_err();
        assert!(err.to_string().contains("No 'main' function found"));
    }

    #[test]
    fn test_duplicate_function_rejected() {
        let err = analyze_source(
            "def f() -> int { return 0; } def f() -> int { return 1; } def main() -> int { return 0; }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate context name (f)"));
    }

    #[test]
    fn test_missing_return_rejected() {
        let err = analyze_source("def main() -> int { int x = 0; }").unwrap_err();
        assert!(err.to_string().contains("does not have a matching return"));
    }

    #[test]
    fn test_return_inside_block_does_not_satisfy_watcher() {
        let err = analyze_source(
            r#"
            def main() -> int {
                int x = 1;
                if (x) { return 1; }
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not have a matching return"));
    }

    #[test]
    fn test_parameter_overflow_rejected() {
        let err = analyze_source(
            "def f(a: int, b: int, c: int, d: int, e: int, g: int, h: int, i: int, j: int) -> int { return a; }
             def main() -> int { return 0; }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceed number permitted"));
    }

    #[test]
    fn test_named_loop_lowering() {
        // loop l { break l; } becomes l = 1; while (l) { break l; }
        let functions =
            analyze_source("def main() -> int { loop l { break l; } return 0; }").unwrap();
        let body = &functions[0].body;

        let Instruction::Assignment { var, expr } = &body[0] else {
            panic!("expected the synthesized counter assignment");
        };
        assert_eq!(var.name, "l");
        assert_eq!(var.data_type, DataType::Integer);
        assert_eq!(expr.items, vec![ExprItem::Value("1".to_string())]);

        let Instruction::While(while_block) = &body[1] else {
            panic!("expected the lowered while loop");
        };
        assert_eq!(
            while_block.cond.items,
            vec![ExprItem::Variable("l".to_string())]
        );
        assert_eq!(while_block.cond.result_type, DataType::Integer);
        assert_eq!(while_block.break_sites, vec!["l".to_string()]);
        assert!(matches!(
            while_block.body[0],
            Instruction::Break { ref label } if label == "l"
        ));
    }

    #[test]
    fn test_named_loop_matches_hand_written_lowering() {
        let lowered =
            analyze_source("def main() -> int { loop l { continue; } return 0; }").unwrap();
        let by_hand =
            analyze_source("def main() -> int { int l = 1; while (l) { continue; } return 0; }")
                .unwrap();

        let Instruction::Assignment { var: a_var, expr: a_expr } = &lowered[0].body[0] else {
            panic!("expected assignment");
        };
        let Instruction::Assignment { var: b_var, expr: b_expr } = &by_hand[0].body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(a_var, b_var);
        assert_eq!(a_expr, b_expr);

        let Instruction::While(a_while) = &lowered[0].body[1] else {
            panic!("expected while");
        };
        let Instruction::While(b_while) = &by_hand[0].body[1] else {
            panic!("expected while");
        };
        assert_eq!(a_while.cond, b_while.cond);
        assert_eq!(a_while.continue_sites, b_while.continue_sites);
    }

    #[test]
    fn test_if_elif_else_chain() {
        let functions = analyze_source(
            r#"
            def main() -> int {
                int x = 1;
                if (x) { x = 2; } elif (x < 5) { x = 3; } else { x = 4; }
                return x;
            }
            "#,
        )
        .unwrap();

        let Instruction::If(head) = &functions[0].body[1] else {
            panic!("expected if chain");
        };
        assert_eq!(head.kind, IfKind::If);
        assert_eq!(head.body.len(), 1);

        let elif = head.trail.as_ref().unwrap();
        assert_eq!(elif.kind, IfKind::Elif);

        // else arrives as elif(1)
        let else_link = elif.trail.as_ref().unwrap();
        assert_eq!(
            else_link.cond.items,
            vec![ExprItem::Value("1".to_string())]
        );
        assert!(else_link.trail.is_none());
    }

    #[test]
    fn test_for_loop_step_recorded() {
        let functions = analyze_source(
            r#"
            def main() -> int {
                for (int i = 0; i < 10; i = i + 1) {
                    int y = i;
                }
                return 0;
            }
            "#,
        )
        .unwrap();

        let body = &functions[0].body;
        // init declaration precedes the loop
        assert!(matches!(&body[0], Instruction::Assignment { var, .. } if var.name == "i"));

        let Instruction::For(for_block) = &body[1] else {
            panic!("expected for block");
        };
        assert_eq!(for_block.body.len(), 1);
        assert!(matches!(
            for_block.step.as_ref(),
            Instruction::Reassignment { var, .. } if var.name == "i"
        ));
    }

    #[test]
    fn test_block_scope_symbols_do_not_leak() {
        let err = analyze_source(
            r#"
            def main() -> int {
                int x = 1;
                if (x) { int y = 2; }
                y = 3;
                return 0;
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("has not yet been defined"));
    }

    #[test]
    fn test_nested_loops_restore_continuable() {
        let functions = analyze_source(
            r#"
            def main() -> int {
                while (1) {
                    while (2) {
                        continue;
                    }
                    continue;
                }
                return 0;
            }
            "#,
        )
        .unwrap();

        let Instruction::While(outer) = &functions[0].body[0] else {
            panic!("expected outer while");
        };
        assert_eq!(outer.continue_sites, 1);
        let Instruction::While(inner) = &outer.body[0] else {
            panic!("expected inner while");
        };
        assert_eq!(inner.continue_sites, 1);
    }

    #[test]
    fn test_continue_without_loop_is_internal_error() {
        // Constructed by hand; the grammar cannot produce this shape
        let unit = TranslationUnit {
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: Vec::new(),
                return_type: DataType::Integer,
                body: vec![
                    Statement::Continue(ContinueStmt { line: 1 }),
                    Statement::Return(ReturnStmt {
                        expr: Some(Box::new(Ast::value(DataType::Integer, "0"))),
                        line: 1,
                    }),
                ],
                line: 1,
            }],
        };

        let map = SourceMap::from_source("test.rill", "def main() -> int { }");
        let mut collector = IrCollector::new();
        let err = analyze(unit, &map, &mut collector).unwrap_err();
        assert!(matches!(err, RillcError::Internal(_)));
    }

    #[test]
    fn test_break_inside_bare_while_is_internal_error() {
        let unit = TranslationUnit {
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: Vec::new(),
                return_type: DataType::Integer,
                body: vec![
                    Statement::While(WhileStmt {
                        cond: Box::new(Ast::value(DataType::Integer, "1")),
                        body: vec![Statement::Break(BreakStmt {
                            name: "w".to_string(),
                            line: 1,
                        })],
                        line: 1,
                    }),
                    Statement::Return(ReturnStmt {
                        expr: Some(Box::new(Ast::value(DataType::Integer, "0"))),
                        line: 1,
                    }),
                ],
                line: 1,
            }],
        };

        let map = SourceMap::from_source("test.rill", "def main() -> int { }");
        let mut collector = IrCollector::new();
        let err = analyze(unit, &map, &mut collector).unwrap_err();
        assert!(matches!(err, RillcError::Internal(_)));
    }

    #[test]
    fn test_immutable_reassignment_rejected() {
        let err = analyze_source(
            "def main() -> int { const int k = 1; k = 2; return 0; }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("immutable"));
    }

    #[test]
    fn test_nil_function_return_policy() {
        // Bare return in a nil function is fine
        analyze_source("def f() -> nil { return; } def main() -> int { return 0; }").unwrap();

        // Returning a value from a nil function is not
        let err = analyze_source("def f() -> nil { return 1; } def main() -> int { return 0; }")
            .unwrap_err();
        assert!(err.to_string().contains("returns nil"));

        // A bare return cannot satisfy an int function
        let err =
            analyze_source("def main() -> int { return; }").unwrap_err();
        assert!(err.to_string().contains("must return a value"));
    }

    #[test]
    fn test_frame_layout_captured() {
        let functions = analyze_source(
            "def main() -> int { int a = 1; int b = 2; return a; }",
        )
        .unwrap();
        let frame = &functions[0].frame;
        assert_eq!(frame.slots.len(), 2);
        assert!(frame.slot_of("a").is_some());
        assert!(frame.slot_of("b").is_some());

        // Frames reset between functions
        let functions = analyze_source(
            "def f() -> int { int x = 1; return x; } def main() -> int { return 0; }",
        )
        .unwrap();
        assert_eq!(functions[1].frame.slots.len(), 0);
    }
}
