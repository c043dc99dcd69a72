//! Pretty error reporting using ariadne
//!
//! Provides colorful, user-friendly error messages with source context.

use crate::errors::RillcError;
use ariadne::{Color, Label, Report, ReportKind, Source};

/// Byte range of a 1-based line in `source`
fn line_span(source: &str, line: usize) -> std::ops::Range<usize> {
    let mut start = 0;
    let mut current = 1;
    for (idx, ch) in source.char_indices() {
        if current == line {
            break;
        }
        if ch == '\n' {
            current += 1;
            start = idx + 1;
        }
    }
    let end = source[start..]
        .find('\n')
        .map(|off| start + off)
        .unwrap_or(source.len());
    start..end
}

/// The primary message and extra notes for an error
fn split_messages(error: &RillcError) -> (String, Vec<String>) {
    match error {
        RillcError::Semantic(report) => {
            let mut messages = report.messages.clone();
            if messages.is_empty() {
                messages.push("semantic error".to_string());
            }
            let first = messages.remove(0);
            (first, messages)
        }
        RillcError::Internal(report) => {
            let mut messages = report.messages.clone();
            if messages.is_empty() {
                messages.push("internal error".to_string());
            }
            let first = messages.remove(0);
            (first, messages)
        }
        other => (other.to_string(), Vec::new()),
    }
}

fn kind_of(error: &RillcError) -> &'static str {
    match error {
        RillcError::Lexer { .. } => "Lexer error",
        RillcError::Parser { .. } => "Parser error",
        RillcError::Semantic(_) => "Semantic error",
        RillcError::Internal(_) => "Internal compiler error",
        RillcError::Preprocessor { .. } => "Preprocessor error",
        RillcError::Io(_) => "IO error",
    }
}

/// Print an error with source context
pub fn print_error(source: &str, filename: &str, error: &RillcError) {
    match error.line() {
        Some(_) => {
            let rendered = format_error(source, filename, error);
            eprint!("{}", rendered);
        }
        None => {
            eprintln!("{}: {}", kind_of(error), error);
        }
    }
}

/// Print multiple errors
pub fn print_errors(source: &str, filename: &str, errors: &[RillcError]) {
    for error in errors {
        print_error(source, filename, error);
    }
}

/// Format an error as a string (for testing)
pub fn format_error(source: &str, filename: &str, error: &RillcError) -> String {
    let Some(line) = error.line() else {
        return format!("{}: {}\n", kind_of(error), error);
    };

    let (message, notes) = split_messages(error);
    let span = line_span(source, line);

    let header = if filename.is_empty() {
        kind_of(error).to_string()
    } else {
        format!("{} in {}", kind_of(error), filename)
    };

    let mut report = Report::build(ReportKind::Error, span.clone())
        .with_message(header)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        );

    for note in notes {
        report = report.with_note(note);
    }

    let mut output = Vec::new();
    report
        .finish()
        .write(Source::from(source), &mut output)
        .expect("failed to write error report");

    String::from_utf8(output).expect("error report should be valid UTF-8")
}
