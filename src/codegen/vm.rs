//! Stack-VM assembly emitter
//!
//! Lowers IR functions to a text assembly listing. Postfix expression items
//! map one-to-one onto stack instructions; block statements lower to labels
//! and conditional jumps.

use super::FunctionSink;
use crate::analysis::DataType;
use crate::errors::{InternalReport, RillcError, RillcResult};
use crate::ir::{
    Expression, ExprItem, ForBlock, IfBlock, Instruction, IrFunction, WhileBlock,
};
use crate::memory::FrameLayout;
use crate::parser::CallParam;

/// Labels of a loop currently being lowered
struct LoopLabels {
    /// Where `continue` (and named-loop `break`) jump back to
    continue_to: String,
    /// The loop counter variable when the loop came from a named loop
    counter: Option<String>,
}

/// Emits stack-VM assembly for completed functions
pub struct VmAssembler {
    lines: Vec<String>,
    label_counter: usize,
    loop_stack: Vec<LoopLabels>,
    frame: FrameLayout,
    errors: Vec<String>,
}

impl VmAssembler {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            label_counter: 0,
            loop_stack: Vec::new(),
            frame: FrameLayout {
                slots: Vec::new(),
                size: 0,
            },
            errors: Vec::new(),
        }
    }

    /// The finished listing, or the first lowering failure
    pub fn finish(self) -> RillcResult<String> {
        if let Some(message) = self.errors.into_iter().next() {
            return Err(RillcError::Internal(InternalReport {
                component: "codegen::VmAssembler",
                file: "vm.rs",
                function: "finish",
                messages: vec![message],
            }));
        }
        Ok(self.lines.join("\n") + "\n")
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(format!("  {}", line.into()));
    }

    fn emit_label(&mut self, label: &str) {
        self.lines.push(format!("{}:", label));
    }

    fn next_label(&mut self, stem: &str) -> String {
        self.label_counter += 1;
        format!(".{}_{}", stem, self.label_counter)
    }

    fn slot_offset(&mut self, name: &str) -> usize {
        match self.frame.slot_of(name) {
            Some(slot) => slot.offset,
            None => {
                self.errors
                    .push(format!("no storage slot recorded for \"{}\"", name));
                0
            }
        }
    }

    // ==================== Functions ====================

    fn lower_function(&mut self, function: &IrFunction) {
        self.frame = function.frame.clone();
        self.lines
            .push(format!(".func {} frame={}", function.name, function.frame.size));

        // The caller pushed arguments left to right; pop them into their
        // slots in reverse
        for param in function.params.iter().rev() {
            let offset = self.slot_offset(&param.name);
            self.emit(format!("store {}    ; param {}", offset, param.name));
        }

        for instruction in &function.body {
            self.lower_instruction(instruction);
        }

        // Nil functions may fall off the end of generated blocks
        if function.return_type == DataType::Nil {
            self.emit("ret0");
        }
        self.lines.push(".endf".to_string());
    }

    fn lower_instruction(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Assignment { var, expr } | Instruction::Reassignment { var, expr } => {
                self.lower_expression(expr);
                let offset = self.slot_offset(&var.name);
                self.emit(format!("store {}    ; {}", offset, var.name));
            }
            Instruction::If(block) => self.lower_if(block),
            Instruction::While(block) => self.lower_while(block),
            Instruction::For(block) => self.lower_for(block),
            Instruction::Return(Some(expr)) => {
                self.lower_expression(expr);
                self.emit("ret");
            }
            Instruction::Return(None) => {
                self.emit("ret0");
            }
            Instruction::Call { name, args } => {
                self.lower_call(name, args);
            }
            Instruction::Continue => match self.loop_stack.last() {
                Some(labels) => {
                    let target = labels.continue_to.clone();
                    self.emit(format!("jmp {}", target));
                }
                None => self
                    .errors
                    .push("continue lowered outside of any loop".to_string()),
            },
            Instruction::Break { label } => self.lower_break(label),
        }
    }

    // ==================== Blocks ====================

    fn lower_if(&mut self, block: &IfBlock) {
        let end = self.next_label("endif");

        let mut link = Some(block);
        while let Some(current) = link {
            let next = self.next_label("elif");
            self.lower_expression(&current.cond);
            self.emit(format!("jz {}", next));
            for instruction in &current.body {
                self.lower_instruction(instruction);
            }
            self.emit(format!("jmp {}", end));
            self.emit_label(&next);
            link = current.trail.as_deref();
        }

        self.emit_label(&end);
    }

    fn lower_while(&mut self, block: &WhileBlock) {
        let top = self.next_label("while");
        let end = self.next_label("endwhile");

        // A single-variable condition marks a lowered named loop; break
        // statements find it by its counter name
        let counter = match block.cond.items.as_slice() {
            [ExprItem::Variable(name)] => Some(name.clone()),
            _ => None,
        };

        self.emit_label(&top);
        self.lower_expression(&block.cond);
        self.emit(format!("jz {}", end));

        self.loop_stack.push(LoopLabels {
            continue_to: top.clone(),
            counter,
        });
        for instruction in &block.body {
            self.lower_instruction(instruction);
        }
        self.loop_stack.pop();

        self.emit(format!("jmp {}", top));
        self.emit_label(&end);
    }

    fn lower_for(&mut self, block: &ForBlock) {
        let top = self.next_label("for");
        let step = self.next_label("step");
        let end = self.next_label("endfor");

        self.emit_label(&top);
        self.lower_expression(&block.cond);
        self.emit(format!("jz {}", end));

        // continue re-runs the step before the next condition check
        self.loop_stack.push(LoopLabels {
            continue_to: step.clone(),
            counter: None,
        });
        for instruction in &block.body {
            self.lower_instruction(instruction);
        }
        self.loop_stack.pop();

        self.emit_label(&step);
        self.lower_instruction(&block.step);
        self.emit(format!("jmp {}", top));
        self.emit_label(&end);
    }

    /// Break zeroes the named loop's counter and jumps back to its check
    fn lower_break(&mut self, label: &str) {
        let target = self
            .loop_stack
            .iter()
            .rev()
            .find(|frame| frame.counter.as_deref() == Some(label))
            .map(|frame| frame.continue_to.clone());

        match target {
            Some(continue_to) => {
                let offset = self.slot_offset(label);
                self.emit("push 0");
                self.emit(format!("store {}    ; {}", offset, label));
                self.emit(format!("jmp {}", continue_to));
            }
            None => self.errors.push(format!(
                "break targets loop \"{}\" but no such loop is being lowered",
                label
            )),
        }
    }

    // ==================== Expressions ====================

    fn lower_expression(&mut self, expr: &Expression) {
        for item in &expr.items {
            self.lower_item(item);
        }
    }

    fn lower_item(&mut self, item: &ExprItem) {
        match item {
            ExprItem::Value(literal) => self.emit(format!("push {}", literal)),
            ExprItem::Variable(name) => {
                let offset = self.slot_offset(name);
                self.emit(format!("load {}    ; {}", offset, name));
            }
            ExprItem::Call { name, args } => self.lower_call(name, args),

            ExprItem::Add => self.emit("add"),
            ExprItem::Sub => self.emit("sub"),
            ExprItem::Mul => self.emit("mul"),
            ExprItem::Div => self.emit("div"),
            ExprItem::Mod => self.emit("mod"),
            ExprItem::Pow => self.emit("pow"),
            ExprItem::Lsh => self.emit("lsh"),
            ExprItem::Rsh => self.emit("rsh"),
            ExprItem::BwAnd => self.emit("band"),
            ExprItem::BwOr => self.emit("bor"),
            ExprItem::BwXor => self.emit("bxor"),
            ExprItem::BwNot => self.emit("bnot"),
            ExprItem::Negate => self.emit("neg"),
            ExprItem::And => self.emit("and"),
            ExprItem::Or => self.emit("or"),
            ExprItem::Lt => self.emit("lt"),
            ExprItem::Lte => self.emit("lte"),
            ExprItem::Gt => self.emit("gt"),
            ExprItem::Gte => self.emit("gte"),
            ExprItem::Eq => self.emit("eq"),
            ExprItem::Ne => self.emit("ne"),
        }
    }

    fn lower_call(&mut self, name: &str, args: &[CallParam]) {
        for arg in args {
            if arg.data_type.is_ref() {
                let offset = self.slot_offset(&arg.name);
                self.emit(format!("lea {}    ; ref {}", offset, arg.name));
            } else if arg.data_type.is_var() {
                let offset = self.slot_offset(&arg.name);
                self.emit(format!("load {}    ; {}", offset, arg.name));
            } else {
                // Plain types mark literal arguments
                self.emit(format!("push {}", arg.name));
            }
        }
        self.emit(format!("call {} {}", name, args.len()));
    }
}

impl Default for VmAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionSink for VmAssembler {
    fn add_ready_function(&mut self, function: IrFunction) {
        self.lower_function(&function);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::Parser;
    use crate::preprocessor::SourceMap;

    fn assemble(source: &str) -> String {
        let unit = Parser::new(source).parse().unwrap();
        let map = SourceMap::from_source("test.rill", source);
        let mut assembler = VmAssembler::new();
        analyze(unit, &map, &mut assembler).unwrap();
        assembler.finish().unwrap()
    }

    #[test]
    fn test_minimal_main_listing() {
        let asm = assemble("def main() -> int { return 0; }");
        assert!(asm.contains(".func main frame=0"));
        assert!(asm.contains("push 0"));
        assert!(asm.contains("ret"));
        assert!(asm.contains(".endf"));
    }

    #[test]
    fn test_expression_lowering_order() {
        let asm = assemble("def main() -> int { int x = 1 + 2 * 3; return x; }");
        let push1 = asm.find("push 1").unwrap();
        let push2 = asm.find("push 2").unwrap();
        let push3 = asm.find("push 3").unwrap();
        let mul = asm.find("\n  mul").unwrap();
        let add = asm.find("\n  add").unwrap();
        assert!(push1 < push2 && push2 < push3 && push3 < mul && mul < add);
        assert!(asm.contains("store 0    ; x"));
    }

    #[test]
    fn test_while_loop_labels() {
        let asm = assemble(
            "def main() -> int { int x = 3; while (x) { x = x - 1; } return 0; }",
        );
        assert!(asm.contains(".while_"));
        assert!(asm.contains(".endwhile_"));
        assert!(asm.contains("jz .endwhile_"));
    }

    #[test]
    fn test_named_loop_break_zeroes_counter() {
        let asm = assemble("def main() -> int { loop l { break l; } return 0; }");
        // Counter declared, checked, then zeroed by the break
        assert!(asm.contains("store 0    ; l"));
        assert!(asm.contains("load 0    ; l"));
        let zero_store = asm.rfind("store 0    ; l").unwrap();
        let first_store = asm.find("store 0    ; l").unwrap();
        assert!(zero_store > first_store);
    }

    #[test]
    fn test_call_arguments_lowered() {
        let asm = assemble(
            r#"
            def f(a: int, ref b: int) -> int { return a; }
            def main() -> int {
                int x = 1;
                f(x, ref x);
                return 0;
            }
            "#,
        );
        assert!(asm.contains("load 0    ; x"));
        assert!(asm.contains("lea 0    ; ref x"));
        assert!(asm.contains("call f 2"));
    }

    #[test]
    fn test_for_loop_runs_step_before_recheck() {
        let asm = assemble(
            "def main() -> int { for (int i = 0; i < 3; i = i + 1) { int y = i; } return 0; }",
        );
        let step_label = asm.find(".step_").unwrap();
        let jmp_top = asm.rfind("jmp .for_").unwrap();
        assert!(step_label < jmp_top);
    }
}
