//! Code generation for Rill
//!
//! The analyzer hands completed IR functions to a [`FunctionSink`]; the VM
//! assembler lowers them to text assembly, and [`IrCollector`] simply keeps
//! them (used by `check` and by tests).

mod vm;

pub use vm::VmAssembler;

use crate::ir::IrFunction;

/// Receiver of completed IR functions, one at a time, in source order
pub trait FunctionSink {
    /// Take ownership of a completed IR function
    fn add_ready_function(&mut self, function: IrFunction);
}

/// A sink that just collects the IR
#[derive(Debug, Default)]
pub struct IrCollector {
    functions: Vec<IrFunction>,
}

impl IrCollector {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    pub fn into_functions(self) -> Vec<IrFunction> {
        self.functions
    }
}

impl FunctionSink for IrCollector {
    fn add_ready_function(&mut self, function: IrFunction) {
        self.functions.push(function);
    }
}
