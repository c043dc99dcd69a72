//! Abstract syntax tree definitions for Rill
//!
//! Expression trees use a uniform node record so the analyzer can walk
//! operators generically; statements are a tagged enum so every handler is
//! checked for coverage at compile time.

use crate::analysis::DataType;

/// The kind of an expression node
#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    /// Parser-internal root marker; must not survive into expressions
    Root,
    /// A literal value; the node's `data_type` and `data` describe it
    Value,
    /// A reference to a named symbol
    Identifier,
    /// A call used inside an expression
    Call(CallData),

    // Binary operators
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
    And,
    Or,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,

    // Unary operators
    BwNot,
    Negate,
}

/// An expression node
///
/// Leaves are `Value`/`Identifier`/`Call`; operator nodes hold children in
/// `left`/`right`. Unary operators populate `left` only, but consumers accept
/// either child slot being filled.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub data_type: DataType,
    pub data: String,
    pub left: Option<Box<Ast>>,
    pub right: Option<Box<Ast>>,
}

impl Ast {
    /// A literal leaf
    pub fn value(data_type: DataType, data: impl Into<String>) -> Self {
        Self {
            kind: AstKind::Value,
            data_type,
            data: data.into(),
            left: None,
            right: None,
        }
    }

    /// An identifier leaf; its type is resolved by the analyzer
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            kind: AstKind::Identifier,
            data_type: DataType::Unknown,
            data: name.into(),
            left: None,
            right: None,
        }
    }

    /// An expression call node
    pub fn call(call: CallData) -> Self {
        let data = call.function_name.clone();
        Self {
            kind: AstKind::Call(call),
            data_type: DataType::Undefined,
            data,
            left: None,
            right: None,
        }
    }

    /// A binary operator node
    pub fn binary(kind: AstKind, left: Ast, right: Ast) -> Self {
        Self {
            kind,
            data_type: DataType::Undefined,
            data: String::new(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// A unary operator node
    pub fn unary(kind: AstKind, operand: Ast) -> Self {
        Self {
            kind,
            data_type: DataType::Undefined,
            data: String::new(),
            left: Some(Box::new(operand)),
            right: None,
        }
    }
}

/// A call's callee and argument descriptors
///
/// Argument types start out `Unknown`/`RefUnknown` for bare identifiers and
/// are promoted by the analyzer during call validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub function_name: String,
    pub params: Vec<CallParam>,
}

/// One call argument: an identifier or a literal, with its declared type
#[derive(Debug, Clone, PartialEq)]
pub struct CallParam {
    pub name: String,
    pub data_type: DataType,
}

/// A complete translation unit
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub functions: Vec<FunctionDef>,
}

/// A function definition
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: DataType,
    pub body: Vec<Statement>,
    pub line: usize,
}

/// A function parameter; `ref` parameters carry a `Ref*` type
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
}

/// A statement inside a function body
#[derive(Debug, Clone)]
pub enum Statement {
    Assignment(AssignmentStmt),
    Reassignment(ReassignmentStmt),
    Call(CallStmt),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    For(Box<ForStmt>),
    NamedLoop(NamedLoopStmt),
    Continue(ContinueStmt),
    Break(BreakStmt),
}

/// A declaring assignment: `const? type name = expr;`
#[derive(Debug, Clone)]
pub struct AssignmentStmt {
    pub name: String,
    pub data_type: DataType,
    pub immutable: bool,
    pub expr: Box<Ast>,
    pub line: usize,
}

/// A reassignment of an existing symbol: `name = expr;`
#[derive(Debug, Clone)]
pub struct ReassignmentStmt {
    pub name: String,
    pub expr: Box<Ast>,
    pub line: usize,
}

/// A call in statement position
#[derive(Debug, Clone)]
pub struct CallStmt {
    pub call: CallData,
    pub line: usize,
}

/// A return statement, with or without a value
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub expr: Option<Box<Ast>>,
    pub line: usize,
}

/// Whether an `If` heads the chain or trails one
///
/// `else` has no kind of its own: the parser emits it as an `Elif` whose
/// condition is the integer literal `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfKind {
    If,
    Elif,
}

/// One link in an if/elif/else chain
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub kind: IfKind,
    pub cond: Box<Ast>,
    pub body: Vec<Statement>,
    pub trail: Option<Box<IfStmt>>,
    pub line: usize,
}

/// A bare while loop
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Box<Ast>,
    pub body: Vec<Statement>,
    pub line: usize,
}

/// A for loop: `for (init cond; step) { body }`
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: AssignmentStmt,
    pub cond: Box<Ast>,
    pub step: ReassignmentStmt,
    pub body: Vec<Statement>,
    pub line: usize,
}

/// A named loop: `loop name { body }`
#[derive(Debug, Clone)]
pub struct NamedLoopStmt {
    pub name: String,
    pub body: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct ContinueStmt {
    pub line: usize,
}

/// A break out of the named loop `name`
#[derive(Debug, Clone)]
pub struct BreakStmt {
    pub name: String,
    pub line: usize,
}
