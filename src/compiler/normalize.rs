//! Compile error normalization
//!
//! Pulls a uniform line/column/message triple out of whatever a compiler
//! reported.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::TransformFailure;

/// A compile failure, attributed to one source file
#[derive(Debug, Clone)]
pub struct CompileError {
    raw: TransformFailure,
    file: PathBuf,
    line: Option<usize>,
    column: Option<usize>,
    message: String,
}

impl CompileError {
    /// Normalize `raw` as a failure of `file`.
    ///
    /// The position comes from the structured fields if present, else from a
    /// `file:line[:col]` prefix in the message, else from the first backtrace
    /// entry. Positions reported against any other file are ignored.
    pub fn new(raw: TransformFailure, file: &Path) -> Self {
        let pattern = source_pattern(file);

        let message_match = pattern
            .as_ref()
            .and_then(|re| re.captures(&raw.message))
            .map(|caps| (number(caps.get(1)), number(caps.get(2))));
        let backtrace_line = || {
            let re = pattern.as_ref()?;
            let first = raw.backtrace.first()?;
            number(re.captures(first)?.get(1))
        };

        let line = raw
            .line
            .or_else(|| message_match.and_then(|(line, _)| line))
            .or_else(backtrace_line);
        let column = raw
            .column
            .or_else(|| message_match.and_then(|(_, column)| column));

        let message = clean_message(&raw.message, pattern.as_ref());

        Self {
            raw,
            file: file.to_path_buf(),
            line,
            column,
            message,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failure as the compiler reported it
    pub fn raw(&self) -> &TransformFailure {
        &self.raw
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.raw)
    }
}

fn source_pattern(file: &Path) -> Option<Regex> {
    let file = regex::escape(&file.to_string_lossy());
    Regex::new(&format!(r"(?m)^{}:(\d+):?(\d+)?[:\s]*", file)).ok()
}

fn number(m: Option<regex::Match<'_>>) -> Option<usize> {
    m.and_then(|m| m.as_str().parse().ok())
}

fn clean_message(message: &str, pattern: Option<&Regex>) -> String {
    let stripped = match pattern {
        Some(re) => re.replace_all(message, "").into_owned(),
        None => message.to_string(),
    };

    let stripped = match stripped.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("error: ") => stripped[7..].to_string(),
        _ => stripped,
    };

    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
