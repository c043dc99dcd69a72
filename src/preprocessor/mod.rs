//! Source preprocessor
//!
//! Resolves `#include "path"` directives into a single flattened source
//! string and keeps a line map so diagnostics can point back at the file
//! and line the user actually wrote.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RillcError, RillcResult};

/// Where one line of the preprocessed output came from
#[derive(Debug, Clone)]
struct LineOrigin {
    file: String,
    user_line: usize,
}

/// The flattened source plus the per-line origin records
///
/// Internal line numbers are 1-based indexes into the flattened text; every
/// consumer of a line number in the compiler means an internal line unless
/// it says otherwise.
#[derive(Debug, Clone)]
pub struct SourceMap {
    text: String,
    origins: Vec<LineOrigin>,
}

impl SourceMap {
    /// Build a map over a raw source string with no includes resolved.
    /// Used by tests and by callers that already hold the full source.
    pub fn from_source(file: impl Into<String>, text: impl Into<String>) -> Self {
        let file = file.into();
        let text = text.into();
        let origins = (1..=text.lines().count().max(1))
            .map(|n| LineOrigin {
                file: file.clone(),
                user_line: n,
            })
            .collect();
        Self { text, origins }
    }

    /// The preprocessed source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The source line as written, for echoing in diagnostics
    pub fn line_text(&self, internal_line: usize) -> String {
        self.text
            .lines()
            .nth(internal_line.saturating_sub(1))
            .unwrap_or("")
            .to_string()
    }

    /// Map an internal line back to the user's line number
    pub fn user_line_number(&self, internal_line: usize) -> usize {
        self.origins
            .get(internal_line.saturating_sub(1))
            .map(|o| o.user_line)
            .unwrap_or(internal_line)
    }

    /// Map an internal line back to the file it came from
    pub fn file_for(&self, internal_line: usize) -> String {
        self.origins
            .get(internal_line.saturating_sub(1))
            .map(|o| o.file.clone())
            .unwrap_or_default()
    }
}

/// Resolves includes and produces the flattened [`SourceMap`]
pub struct Preprocessor {
    include_stack: Vec<PathBuf>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            include_stack: Vec::new(),
        }
    }

    /// Process a file and all of its includes
    pub fn process(&mut self, path: &Path) -> RillcResult<SourceMap> {
        let mut text = String::new();
        let mut origins = Vec::new();
        self.process_file(path, &mut text, &mut origins)?;
        Ok(SourceMap { text, origins })
    }

    fn process_file(
        &mut self,
        path: &Path,
        text: &mut String,
        origins: &mut Vec<LineOrigin>,
    ) -> RillcResult<()> {
        let canonical = path
            .canonicalize()
            .map_err(|e| self.include_failure(path, &e.to_string()))?;

        if self.include_stack.contains(&canonical) {
            return Err(self.include_failure(path, "include cycle detected"));
        }

        let source = fs::read_to_string(&canonical)
            .map_err(|e| self.include_failure(path, &e.to_string()))?;

        self.include_stack.push(canonical.clone());
        let display_name = path.display().to_string();
        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        for (idx, line) in source.lines().enumerate() {
            if let Some(target) = parse_include(line) {
                self.process_file(&base_dir.join(target), text, origins)?;
            } else {
                text.push_str(line);
                text.push('\n');
                origins.push(LineOrigin {
                    file: display_name.clone(),
                    user_line: idx + 1,
                });
            }
        }

        self.include_stack.pop();
        Ok(())
    }

    /// An include failure reported with the chain of files that led here
    fn include_failure(&self, path: &Path, reason: &str) -> RillcError {
        let mut message = format!("unable to include \"{}\": {}", path.display(), reason);
        if !self.include_stack.is_empty() {
            message.push_str("; include history:");
            for entry in self.include_stack.iter().rev() {
                message.push_str(&format!(" <- {}", entry.display()));
            }
        }
        RillcError::preprocessor(message)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an `#include "path"` directive, returning the path if the line is one
fn parse_include(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("#include")?;
    let rest = rest.trim();
    rest.strip_prefix('"')?.strip_suffix('"')
}
