//! Parsing for Rill

mod ast;
mod parser;

pub use ast::{
    AssignmentStmt, Ast, AstKind, BreakStmt, CallData, CallParam, CallStmt, ContinueStmt,
    ForStmt, FunctionDef, IfKind, IfStmt, NamedLoopStmt, Param, ReassignmentStmt, ReturnStmt,
    Statement, TranslationUnit, WhileStmt,
};
pub use parser::Parser;
