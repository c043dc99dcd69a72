//! Intermediate representation handed to the back end
//!
//! IR statements mirror the source's block structure, but expressions are
//! flattened into a postfix item sequence the stack VM can execute directly.

use crate::analysis::DataType;
use crate::memory::FrameLayout;
use crate::parser::{CallParam, IfKind, Param};

/// One item of a postfix-encoded expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExprItem {
    /// A literal operand
    Value(String),
    /// A reference to a named symbol in scope
    Variable(String),
    /// A call whose arguments are already type-resolved
    Call { name: String, args: Vec<CallParam> },

    // Pure operators
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lsh,
    Rsh,
    BwAnd,
    BwOr,
    BwXor,
    BwNot,
    Negate,
    And,
    Or,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
}

impl ExprItem {
    /// Operators take operands off the stack; leaves push onto it
    pub fn is_operator(&self) -> bool {
        !matches!(
            self,
            ExprItem::Value(_) | ExprItem::Variable(_) | ExprItem::Call { .. }
        )
    }
}

/// A typed postfix expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub result_type: DataType,
    pub items: Vec<ExprItem>,
}

impl Expression {
    pub fn new(result_type: DataType, items: Vec<ExprItem>) -> Self {
        Self { result_type, items }
    }
}

/// A typed storage target
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
}

impl Variable {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An IR statement
#[derive(Debug, Clone)]
pub enum Instruction {
    Assignment { var: Variable, expr: Expression },
    Reassignment { var: Variable, expr: Expression },
    If(IfBlock),
    While(WhileBlock),
    For(ForBlock),
    Return(Option<Expression>),
    Call { name: String, args: Vec<CallParam> },
    Continue,
    Break { label: String },
}

/// One link of a lowered if/elif chain
#[derive(Debug, Clone)]
pub struct IfBlock {
    pub kind: IfKind,
    pub cond: Expression,
    pub body: Vec<Instruction>,
    pub trail: Option<Box<IfBlock>>,
}

/// A lowered while loop (named loops lower to this form as well)
#[derive(Debug, Clone)]
pub struct WhileBlock {
    pub cond: Expression,
    pub body: Vec<Instruction>,
    /// Number of continue statements targeting this loop
    pub continue_sites: usize,
    /// Names carried by break statements targeting this loop
    pub break_sites: Vec<String>,
}

/// A lowered for loop; the step runs after the body on every iteration
#[derive(Debug, Clone)]
pub struct ForBlock {
    pub cond: Expression,
    pub body: Vec<Instruction>,
    pub step: Box<Instruction>,
    pub continue_sites: usize,
}

/// A completed function, ready for code generation
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub return_type: DataType,
    pub params: Vec<Param>,
    pub body: Vec<Instruction>,
    /// Storage layout captured when the function was handed over
    pub frame: FrameLayout,
}
