//! Expression validation and postfix construction
//!
//! These methods enforce the typing rules while flattening expression trees
//! into the analyzer's scratch postfix buffer: every leaf of an expression
//! must match the expected top-level type exactly, and calls are checked
//! against their callee's recorded signature with `base_equal`.

use super::analyzer::Analyzer;
use super::types::{DataType, base_equal};
use crate::errors::RillcResult;
use crate::ir::ExprItem;
use crate::parser::{Ast, AstKind, CallData};

impl<'a> Analyzer<'a> {
    /// Error if `id` is not visible; when `allowed` is non-empty, also error
    /// unless the symbol's type is one of the allowed types.
    pub(super) fn ensure_id_in_current_context(
        &mut self,
        id: &str,
        line: usize,
        allowed: &[DataType],
    ) -> RillcResult<()> {
        if !self.symbols.does_symbol_exist(id) {
            return Err(
                self.semantic_error(line, vec![format!("Unknown identifier \"{}\"", id)])
            );
        }

        if allowed.is_empty() {
            return Ok(());
        }

        let is_allowed = allowed
            .iter()
            .any(|ty| self.symbols.is_existing_symbol_of_type(id, *ty));
        if !is_allowed {
            let found = self
                .symbols
                .get_value_type(id)
                .map(|ty| ty.to_string())
                .unwrap_or_else(|| "undefined".to_string());
            return Err(self.semantic_error(
                line,
                vec![format!(
                    "Type of identifier \"{}\" ({}) not permitted in current operation",
                    id, found
                )],
            ));
        }
        Ok(())
    }

    /// Look up the type of an identifier used in an expression
    pub(super) fn get_id_type(&mut self, id: &str, line: usize) -> RillcResult<DataType> {
        match self.symbols.get_value_type(id) {
            Some(data_type) => Ok(data_type),
            None => Err(self.semantic_error(
                line,
                vec![format!(
                    "Symbol \"{}\" used in expression does not exist",
                    id
                )],
            )),
        }
    }

    /// Determine the type of an expression by descending to its first leaf.
    ///
    /// Only the left spine is walked (falling over to the right when a left
    /// child is absent); the strict all-leaves-match rule enforced by
    /// [`Self::build_expression`] makes inspecting the remaining leaves
    /// redundant.
    pub(super) fn determine_expression_type(
        &mut self,
        ast: &mut Ast,
        line: usize,
    ) -> RillcResult<DataType> {
        match &mut ast.kind {
            AstKind::Value => Ok(ast.data_type),
            AstKind::Identifier => {
                let name = ast.data.clone();
                self.get_id_type(&name, line)
            }
            AstKind::Call(call) => {
                self.validate_call(call, line)?;
                let callee = call.function_name.clone();

                match self.symbols.get_return_type_of_context(&callee) {
                    Some(return_type) => Ok(return_type),
                    None => Err(self.internal_error(
                        "determine_expression_type",
                        vec![format!(
                            "call to \"{}\" validated but its context has no return type",
                            callee
                        )],
                    )),
                }
            }
            AstKind::Root => Err(self.internal_error(
                "determine_expression_type",
                vec!["a ROOT node reached expression typing".to_string()],
            )),
            _ => {
                if let Some(left) = ast.left.as_deref_mut() {
                    self.determine_expression_type(left, line)
                } else if let Some(right) = ast.right.as_deref_mut() {
                    self.determine_expression_type(right, line)
                } else {
                    Err(self.internal_error(
                        "determine_expression_type",
                        vec!["failed to determine expression type: operator node has no \
                              children"
                            .to_string()],
                    ))
                }
            }
        }
    }

    /// Validate a call against its callee's signature, promoting `Unknown`
    /// argument placeholders to their resolved `Var*`/`Ref*` types in place.
    pub(super) fn validate_call(&mut self, call: &mut CallData, line: usize) -> RillcResult<()> {
        // Recursion is unimplemented in the back end, so a self-call can
        // never be satisfied
        if self.current_function_name() == Some(call.function_name.as_str()) {
            return Err(self.internal_error(
                "validate_call",
                vec![format!(
                    "Recursion is not yet supported. A recursive call was detected on line : {} \
                     of file : {}",
                    self.source.user_line_number(line),
                    self.source.file_for(line)
                )],
            ));
        }

        if !self.symbols.does_context_exist(&call.function_name) {
            return Err(self.semantic_error(
                line,
                vec![format!(
                    "Unknown function name given for call ({})",
                    call.function_name
                )],
            ));
        }

        let signature: Vec<_> = self
            .symbols
            .get_context_parameters(&call.function_name)
            .map(|params| params.to_vec())
            .unwrap_or_default();

        if signature.len() != call.params.len() {
            return Err(self.semantic_error(
                line,
                vec![
                    format!(
                        "Mismatched number of parameters given for call to : {}",
                        call.function_name
                    ),
                    format!(
                        "Expected {}, but given {}",
                        signature.len(),
                        call.params.len()
                    ),
                ],
            ));
        }

        // Resolve bare-identifier arguments through the symbol table
        for param in call.params.iter_mut() {
            match param.data_type {
                DataType::Unknown => {
                    let name = param.name.clone();
                    self.ensure_id_in_current_context(&name, line, &[])?;
                    match self.symbols.get_value_type(&name).and_then(|ty| ty.base()) {
                        Some(base) => param.data_type = base.var(),
                        None => {
                            return Err(self.internal_error(
                                "validate_call",
                                vec![
                                    "Default accessed while attempting to set a parameter \
                                     variable type"
                                        .to_string(),
                                ],
                            ));
                        }
                    }
                }
                DataType::RefUnknown => {
                    let name = param.name.clone();
                    self.ensure_id_in_current_context(&name, line, &[])?;
                    match self.symbols.get_value_type(&name).and_then(|ty| ty.base()) {
                        Some(base) => param.data_type = base.by_ref(),
                        None => {
                            return Err(self.internal_error(
                                "validate_call",
                                vec![
                                    "Default accessed while attempting to set a parameter \
                                     reference type"
                                        .to_string(),
                                ],
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        // base_equal collapses Var/Ref/plain prefixes, so a var int argument
        // satisfies an int or ref int parameter slot
        for (argument, expected) in call.params.iter().zip(signature.iter()) {
            if !base_equal(argument.data_type, expected.data_type) {
                return Err(self.semantic_error(
                    line,
                    vec![
                        format!(
                            "Given parameter \"{}\" doesn't match expected data type for call \
                             to : {}",
                            argument.name, call.function_name
                        ),
                        format!("Received type  : {}", argument.data_type),
                        format!("Expected type  : {}", expected.data_type),
                    ],
                ));
            }
        }

        Ok(())
    }

    /// Walk an expression tree in post-order, appending postfix items to the
    /// scratch buffer. Every leaf must match `expected` exactly.
    pub(super) fn build_expression(
        &mut self,
        target: &str,
        ast: &mut Ast,
        expected: DataType,
        line: usize,
    ) -> RillcResult<()> {
        match &mut ast.kind {
            AstKind::Identifier => {
                let name = ast.data.clone();
                if !self.symbols.does_symbol_exist(&name) {
                    return Err(self.semantic_error(
                        line,
                        vec![format!(
                            "Symbol \"{}\" used in expression does not exist",
                            name
                        )],
                    ));
                }

                let found = self
                    .symbols
                    .get_value_type(&name)
                    .expect("symbol existence checked above");
                if found != expected {
                    return Err(self.semantic_error(
                        line,
                        vec![format!(
                            "Type of \"{}\" is \"{}\", which is incompatible with type of \
                             \"{}\" which is type \"{}\"",
                            name, found, target, expected
                        )],
                    ));
                }

                self.pending.push(ExprItem::Variable(name));
                Ok(())
            }
            AstKind::Value => {
                if ast.data_type != expected {
                    return Err(self.semantic_error(
                        line,
                        vec![format!(
                            "Type of \"{}\" is \"{}\", which is incompatible with type of \
                             \"{}\" which is type \"{}\"",
                            ast.data, ast.data_type, target, expected
                        )],
                    ));
                }

                self.pending.push(ExprItem::Value(ast.data.clone()));
                Ok(())
            }
            AstKind::Call(call) => {
                self.validate_call(call, line)?;
                self.pending.push(ExprItem::Call {
                    name: call.function_name.clone(),
                    args: call.params.clone(),
                });
                Ok(())
            }
            AstKind::Root => Err(self.internal_error(
                "build_expression",
                vec![
                    "A ROOT node slipped into expression building. The parser should not have \
                     allowed this"
                        .to_string(),
                ],
            )),
            _ => {
                let operator = match operator_item(&ast.kind) {
                    Some(item) => item,
                    None => {
                        return Err(self.internal_error(
                            "build_expression",
                            vec![
                                "An unhandled AST node type was reached while walking the tree"
                                    .to_string(),
                            ],
                        ));
                    }
                };

                if ast.left.is_none() && ast.right.is_none() {
                    return Err(self.internal_error(
                        "build_expression",
                        vec!["operator node is missing its children".to_string()],
                    ));
                }

                // Unary nodes may populate either child slot; recurse over
                // whatever is present, left first
                if let Some(left) = ast.left.as_deref_mut() {
                    self.build_expression(target, left, expected, line)?;
                }
                if let Some(right) = ast.right.as_deref_mut() {
                    self.build_expression(target, right, expected, line)?;
                }

                self.pending.push(operator);
                Ok(())
            }
        }
    }
}

/// The postfix item for an operator node kind
fn operator_item(kind: &AstKind) -> Option<ExprItem> {
    let item = match kind {
        AstKind::Add => ExprItem::Add,
        AstKind::Sub => ExprItem::Sub,
        AstKind::Mul => ExprItem::Mul,
        AstKind::Div => ExprItem::Div,
        AstKind::Mod => ExprItem::Mod,
        AstKind::Pow => ExprItem::Pow,
        AstKind::Lsh => ExprItem::Lsh,
        AstKind::Rsh => ExprItem::Rsh,
        AstKind::BwAnd => ExprItem::BwAnd,
        AstKind::BwOr => ExprItem::BwOr,
        AstKind::BwXor => ExprItem::BwXor,
        AstKind::BwNot => ExprItem::BwNot,
        AstKind::Negate => ExprItem::Negate,
        AstKind::And => ExprItem::And,
        AstKind::Or => ExprItem::Or,
        AstKind::Lt => ExprItem::Lt,
        AstKind::Lte => ExprItem::Lte,
        AstKind::Gt => ExprItem::Gt,
        AstKind::Gte => ExprItem::Gte,
        AstKind::Eq => ExprItem::Eq,
        AstKind::Ne => ExprItem::Ne,
        _ => return None,
    };
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::codegen::IrCollector;
    use crate::errors::{RillcError, RillcResult};
    use crate::ir::{Instruction, IrFunction};
    use crate::parser::Parser;
    use crate::preprocessor::SourceMap;

    fn analyze_source(source: &str) -> RillcResult<Vec<IrFunction>> {
        let unit = Parser::new(source).parse()?;
        let map = SourceMap::from_source("test.rill", source);
        let mut collector = IrCollector::new();
        analyze(unit, &map, &mut collector)?;
        Ok(collector.into_functions())
    }

    #[test]
    fn test_postfix_order() {
        let functions =
            analyze_source("def main() -> int { int x = 1 + 2 * 3; return x; }").unwrap();
        let Instruction::Assignment { expr, .. } = &functions[0].body[0] else {
            panic!("expected assignment");
        };

        assert_eq!(
            expr.items,
            vec![
                ExprItem::Value("1".to_string()),
                ExprItem::Value("2".to_string()),
                ExprItem::Value("3".to_string()),
                ExprItem::Mul,
                ExprItem::Add,
            ]
        );
    }

    #[test]
    fn test_unary_postfix() {
        let functions = analyze_source("def main() -> int { int x = -(1 + 2); return x; }").unwrap();
        let Instruction::Assignment { expr, .. } = &functions[0].body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            expr.items,
            vec![
                ExprItem::Value("1".to_string()),
                ExprItem::Value("2".to_string()),
                ExprItem::Add,
                ExprItem::Negate,
            ]
        );
    }

    #[test]
    fn test_every_leaf_matches_result_type() {
        let functions = analyze_source(
            "def main() -> int { int a = 1; int b = a + 2; int c = a * b - 3; return c; }",
        )
        .unwrap();

        for instruction in &functions[0].body {
            let Instruction::Assignment { expr, .. } = instruction else {
                continue;
            };
            for item in &expr.items {
                match item {
                    ExprItem::Value(_) | ExprItem::Variable(_) => {
                        // Values and variables were checked against the
                        // expression's result type during construction
                        assert_eq!(expr.result_type, DataType::Integer);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let err =
            analyze_source("def main() -> int { int x = 1; int x = 2; return x; }").unwrap_err();
        let RillcError::Semantic(report) = &err else {
            panic!("expected a semantic report, got {:?}", err);
        };
        assert!(report.messages[0].contains("Symbol \"x\""));
        assert!(report.messages[0].contains("not unique"));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let err = analyze_source(
            r#"
            def f(a: int) -> int { return a; }
            def main() -> int {
                f();
                return 0;
            }
            "#,
        )
        .unwrap_err();

        let RillcError::Semantic(report) = &err else {
            panic!("expected a semantic report, got {:?}", err);
        };
        assert!(report.messages[0].contains("Mismatched number of parameters"));
        assert!(report.messages[1].contains("Expected 1, but given 0"));
    }

    #[test]
    fn test_expression_type_mismatch_rejected() {
        let err = analyze_source("def main() -> int { int x = 1 + 2.0; return x; }").unwrap_err();
        let RillcError::Semantic(report) = &err else {
            panic!("expected a semantic report, got {:?}", err);
        };
        assert!(report.messages[0].contains("2.0"));
        assert!(report.messages[0].contains("double"));
        assert!(report.messages[0].contains("int"));
    }

    #[test]
    fn test_self_call_is_internal_report() {
        let err = analyze_source(
            "def f() -> int { f(); return 0; } def main() -> int { return 0; }",
        )
        .unwrap_err();

        let RillcError::Internal(report) = &err else {
            panic!("expected an internal report, got {:?}", err);
        };
        assert!(report.messages[0].contains("Recursion is not yet supported"));
        assert!(report.messages[0].contains("line : 1"));
    }

    #[test]
    fn test_unknown_callee_rejected() {
        let err = analyze_source("def main() -> int { g(); return 0; }").unwrap_err();
        assert!(err.to_string().contains("Unknown function name"));
    }

    #[test]
    fn test_undefined_symbol_in_expression_rejected() {
        let err = analyze_source("def main() -> int { int x = y + 1; return x; }").unwrap_err();
        assert!(err.to_string().contains("\"y\""));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_call_argument_promotion() {
        let functions = analyze_source(
            r#"
            def f(a: int, ref b: double) -> int { return a; }
            def main() -> int {
                int x = 1;
                double y = 2.0;
                f(x, ref y);
                return 0;
            }
            "#,
        )
        .unwrap();

        let Instruction::Call { args, .. } = &functions[1].body[2] else {
            panic!("expected call instruction");
        };
        // Unknown/RefUnknown placeholders were promoted in place
        assert_eq!(args[0].data_type, DataType::VarInteger);
        assert_eq!(args[1].data_type, DataType::RefDouble);

        // After promotion, every argument base-matches its parameter
        assert!(base_equal(args[0].data_type, DataType::Integer));
        assert!(base_equal(args[1].data_type, DataType::RefDouble));
    }

    #[test]
    fn test_call_argument_base_mismatch_rejected() {
        let err = analyze_source(
            r#"
            def f(a: int) -> int { return a; }
            def main() -> int {
                double y = 2.0;
                f(y);
                return 0;
            }
            "#,
        )
        .unwrap_err();

        let RillcError::Semantic(report) = &err else {
            panic!("expected a semantic report, got {:?}", err);
        };
        assert!(report.messages[0].contains("doesn't match expected data type"));
    }

    #[test]
    fn test_call_in_expression_uses_callee_return_type() {
        let functions = analyze_source(
            r#"
            def five() -> int { return 5; }
            def main() -> int {
                int x = five() + 1;
                return x;
            }
            "#,
        )
        .unwrap();

        let Instruction::Assignment { expr, .. } = &functions[1].body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(expr.result_type, DataType::Integer);
        assert!(matches!(
            &expr.items[0],
            ExprItem::Call { name, .. } if name == "five"
        ));
        assert_eq!(expr.items[1], ExprItem::Value("1".to_string()));
        assert_eq!(expr.items[2], ExprItem::Add);
    }

    #[test]
    fn test_condition_type_follows_left_spine() {
        // Condition of double type is legal: nonzero is true
        let functions = analyze_source(
            r#"
            def main() -> int {
                double d = 1.5;
                while (d > 0.5) { d = d - 0.25; }
                return 0;
            }
            "#,
        )
        .unwrap();

        let Instruction::While(while_block) = &functions[0].body[1] else {
            panic!("expected while");
        };
        assert_eq!(while_block.cond.result_type, DataType::Double);
    }

    #[test]
    fn test_allowed_type_filter() {
        let map = SourceMap::from_source("t.rill", "int x = 1;\n");
        let mut analyzer = crate::analysis::Analyzer::new(&map);
        analyzer.symbols.new_context("f").unwrap();
        analyzer
            .symbols
            .add_symbol("x", DataType::Integer, false)
            .unwrap();

        assert!(
            analyzer
                .ensure_id_in_current_context("x", 1, &[DataType::Integer])
                .is_ok()
        );
        assert!(
            analyzer
                .ensure_id_in_current_context("x", 1, &[DataType::Double])
                .is_err()
        );
        assert!(
            analyzer
                .ensure_id_in_current_context("missing", 1, &[])
                .is_err()
        );
    }

    #[test]
    fn test_string_and_char_expressions() {
        let functions = analyze_source(
            r#"
            def main() -> int {
                string s = "hi";
                char c = 'x';
                return 0;
            }
            "#,
        )
        .unwrap();

        let Instruction::Assignment { expr, .. } = &functions[0].body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(expr.result_type, DataType::Str);
        let Instruction::Assignment { expr, .. } = &functions[0].body[1] else {
            panic!("expected assignment");
        };
        assert_eq!(expr.result_type, DataType::Char);
    }
}
