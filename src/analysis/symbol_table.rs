//! Symbol table: named contexts, block scopes, and function signatures
//!
//! Each function gets a *context* holding its parameters, return type and
//! symbols. Contexts survive (emptied) after their function completes so
//! later calls can still resolve the signature. Nested blocks inside a
//! function are child scopes within the active context.

use std::collections::HashMap;

use super::types::DataType;
use crate::memory::{FrameLayout, LayoutManager};
use crate::parser::Param;

/// A symbol's recorded type and mutability
#[derive(Debug, Clone, Copy)]
pub struct SymbolInfo {
    pub data_type: DataType,
    pub immutable: bool,
}

/// A named scope corresponding to a source function
#[derive(Debug)]
struct Context {
    parameters: Vec<Param>,
    return_type: DataType,
    symbols: HashMap<String, SymbolInfo>,
    /// Scopes of nested blocks, innermost last
    child_scopes: Vec<HashMap<String, SymbolInfo>>,
}

impl Context {
    fn new() -> Self {
        Self {
            parameters: Vec::new(),
            return_type: DataType::Undefined,
            symbols: HashMap::new(),
            child_scopes: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&SymbolInfo> {
        for scope in self.child_scopes.iter().rev() {
            if let Some(info) = scope.get(name) {
                return Some(info);
            }
        }
        self.symbols.get(name)
    }

    fn reaches(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// The symbol table: a registry of contexts plus the active-context stack.
/// Owns the memory layout manager so declaring a symbol also reserves its
/// storage slot.
#[derive(Debug)]
pub struct SymbolTable {
    contexts: HashMap<String, Context>,
    active: Vec<String>,
    layout: LayoutManager,
    unique_counter: u64,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            active: Vec::new(),
            layout: LayoutManager::new(),
            unique_counter: 0,
        }
    }

    // ==================== Contexts ====================

    /// Begin a new function scope. Fails if the name is already a context.
    pub fn new_context(&mut self, name: &str) -> Result<(), String> {
        if self.contexts.contains_key(name) {
            return Err(format!("context '{}' already exists", name));
        }
        self.contexts.insert(name.to_string(), Context::new());
        self.active.push(name.to_string());
        Ok(())
    }

    pub fn does_context_exist(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    pub fn current_context_name(&self) -> Option<&str> {
        self.active.last().map(String::as_str)
    }

    fn current(&self) -> Option<&Context> {
        self.active.last().and_then(|name| self.contexts.get(name))
    }

    fn current_mut(&mut self) -> Option<&mut Context> {
        let name = self.active.last()?.clone();
        self.contexts.get_mut(&name)
    }

    /// Record the parameter signature and make each parameter reachable as a
    /// symbol of its base type (by-ref parameters read like locals inside the
    /// function body). Each parameter also gets a storage slot.
    pub fn add_parameters_to_current_context(&mut self, params: Vec<Param>) -> Result<(), String> {
        for param in &params {
            let base = param
                .data_type
                .base()
                .ok_or_else(|| format!("parameter '{}' has no value type", param.name))?;
            self.layout.allocate_for(&param.name)?;
            if let Some(context) = self.current_mut() {
                context.symbols.insert(
                    param.name.clone(),
                    SymbolInfo {
                        data_type: base.plain(),
                        immutable: false,
                    },
                );
            }
        }
        if let Some(context) = self.current_mut() {
            context.parameters = params;
        }
        Ok(())
    }

    pub fn add_return_type_to_current_context(&mut self, return_type: DataType) {
        if let Some(context) = self.current_mut() {
            context.return_type = return_type;
        }
    }

    pub fn get_context_parameters(&self, name: &str) -> Option<&[Param]> {
        self.contexts.get(name).map(|c| c.parameters.as_slice())
    }

    pub fn get_return_type_of_context(&self, name: &str) -> Option<DataType> {
        self.contexts.get(name).map(|c| c.return_type)
    }

    /// Delete all symbols of a completed context but retain its signature
    pub fn clear_existing_context(&mut self, name: &str) {
        if let Some(context) = self.contexts.get_mut(name) {
            context.symbols.clear();
            context.child_scopes.clear();
        }
    }

    // ==================== Block scopes ====================

    pub fn push_scope(&mut self) {
        if let Some(context) = self.current_mut() {
            context.child_scopes.push(HashMap::new());
        }
    }

    pub fn pop_scope(&mut self) {
        if let Some(context) = self.current_mut() {
            context.child_scopes.pop();
        }
    }

    /// True when the walk is inside a nested block of the current function
    pub fn in_block_scope(&self) -> bool {
        self.current()
            .map(|c| !c.child_scopes.is_empty())
            .unwrap_or(false)
    }

    // ==================== Symbols ====================

    /// Declare a symbol in the innermost block of the current context.
    /// Fails if the name already reaches from here. Allocates a storage slot.
    pub fn add_symbol(
        &mut self,
        name: &str,
        data_type: DataType,
        immutable: bool,
    ) -> Result<(), String> {
        let Some(context) = self.current() else {
            return Err("no active context".to_string());
        };
        if context.reaches(name) {
            return Err(format!("symbol '{}' is not unique", name));
        }

        self.layout.allocate_for(name)?;

        let info = SymbolInfo {
            data_type,
            immutable,
        };
        let context = self.current_mut().expect("checked above");
        match context.child_scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string(), info),
            None => context.symbols.insert(name.to_string(), info),
        };
        Ok(())
    }

    pub fn does_symbol_exist(&self, name: &str) -> bool {
        self.current().map(|c| c.reaches(name)).unwrap_or(false)
    }

    pub fn is_existing_symbol_of_type(&self, name: &str, data_type: DataType) -> bool {
        self.get_value_type(name) == Some(data_type)
    }

    pub fn get_value_type(&self, name: &str) -> Option<DataType> {
        self.current()
            .and_then(|c| c.lookup(name))
            .map(|info| info.data_type)
    }

    pub fn is_symbol_immutable(&self, name: &str) -> bool {
        self.current()
            .and_then(|c| c.lookup(name))
            .map(|info| info.immutable)
            .unwrap_or(false)
    }

    // ==================== Generated names ====================
    //
    // Generated names embed "__", which the scanner rejects in user
    // identifiers, so they can never collide with parsed symbols.

    pub fn generate_unique_variable_symbol(&mut self) -> String {
        self.unique_counter += 1;
        format!("__var__{}", self.unique_counter)
    }

    pub fn generate_unique_context(&mut self) -> String {
        self.unique_counter += 1;
        format!("__context__{}", self.unique_counter)
    }

    pub fn generate_unique_return_symbol(&mut self) -> String {
        self.unique_counter += 1;
        format!("__return__assignment__{}", self.unique_counter)
    }

    pub fn generate_unique_call_param_symbol(&mut self) -> String {
        self.unique_counter += 1;
        format!("__param__{}", self.unique_counter)
    }

    // ==================== Storage ====================

    /// Capture the frame layout of the function under analysis
    pub fn frame_snapshot(&self) -> FrameLayout {
        self.layout.snapshot()
    }

    /// Reset storage for the next function
    pub fn reset_memory(&mut self) {
        self.layout.reset();
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
