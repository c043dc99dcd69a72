//! Semantic analysis and IR construction for Rill
//!
//! A single-pass visitor validates the parsed translation unit against the
//! language's static semantics and lowers it to the IR consumed by the back
//! end.

mod analyzer;
mod checker;
mod symbol_table;
mod types;

pub use analyzer::Analyzer;
pub use symbol_table::{SymbolInfo, SymbolTable};
pub use types::{BaseKind, DataType, base_equal};

use crate::codegen::FunctionSink;
use crate::errors::RillcResult;
use crate::parser::TranslationUnit;
use crate::preprocessor::SourceMap;

/// Hard cap on the number of parameters a function may declare
pub const MAX_FUNCTION_PARAMS: usize = 8;

/// Analyze a translation unit, handing each completed IR function to `sink`
pub fn analyze(
    unit: TranslationUnit,
    source: &SourceMap,
    sink: &mut dyn FunctionSink,
) -> RillcResult<()> {
    Analyzer::new(source).run(unit, sink)
}
