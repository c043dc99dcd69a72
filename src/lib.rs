//! rillc - a compiler for the Rill language
//!
//! Rill is a small imperative, statically-typed language. The compiler
//! preprocesses includes, parses to an AST, semantically analyzes and lowers
//! to a postfix IR, and emits text assembly for a stack virtual machine.

pub mod analysis;
pub mod codegen;
pub mod errors;
pub mod ir;
pub mod lexer;
pub mod memory;
pub mod parser;
pub mod preprocessor;

// Re-export commonly used types
pub use analysis::{Analyzer, DataType, analyze};
pub use codegen::{FunctionSink, IrCollector, VmAssembler};
pub use errors::{RillcError, RillcResult};
pub use ir::IrFunction;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, TranslationUnit};
pub use preprocessor::{Preprocessor, SourceMap};
