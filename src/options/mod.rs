//! Compiler option values
//!
//! Option tokens arrive as strings (`-o haml:format::xhtml`, `options = [...]`
//! in the config file) and are converted into typed values:
//!
//! | token        | value                        |
//! |--------------|------------------------------|
//! | *(absent)*   | `true`                       |
//! | `false`      | `false`                      |
//! | `+007`       | `7`                          |
//! | `-.5`        | `-0.5`                       |
//! | `:html5`     | tag `html5`                  |
//! | `"a:b"`      | string `a:b`                 |
//! | `one::two`   | `["one", tag two]`           |


use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{LiveBuildError, LiveBuildResult};

/// Options of one adapter scope, keyed by option name
pub type OptionsMap = BTreeMap<String, OptionValue>;

/// A typed compiler option value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Interned-symbol-like value, written with a leading colon
    Tag(String),
    Str(String),
    List(Vec<OptionValue>),
}

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d*\.\d+$").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:[^:]+$").unwrap());
static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^'[^']*'$").unwrap());
static DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^"[^"]*"$"#).unwrap());

impl OptionValue {
    /// Convert a raw token. `None` means the option was given without a
    /// value, which is `true`.
    pub fn parse(token: Option<&str>) -> OptionValue {
        let Some(value) = token else {
            return OptionValue::Bool(true);
        };

        match value {
            "true" => return OptionValue::Bool(true),
            "false" => return OptionValue::Bool(false),
            _ => {}
        }

        if INTEGER.is_match(value) {
            if let Ok(n) = value.parse::<i64>() {
                return OptionValue::Int(n);
            }
        } else if FLOAT.is_match(value) {
            if let Ok(f) = value.parse::<f64>() {
                return OptionValue::Float(f);
            }
        }

        if TAG.is_match(value) {
            OptionValue::Tag(value[1..].to_string())
        } else if SINGLE_QUOTED.is_match(value) || DOUBLE_QUOTED.is_match(value) {
            OptionValue::Str(value[1..value.len() - 1].to_string())
        } else if value.contains(':') {
            OptionValue::List(to_list(value))
        } else {
            OptionValue::Str(value.to_string())
        }
    }

    /// Truthiness used by feature flags: `false` and empty lists are off,
    /// everything else is on.
    pub fn is_enabled(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// Flatten into command line words, lists yield one word per element.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            OptionValue::List(items) => items.iter().flat_map(|v| v.to_args()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Tag(t) => write!(f, "{}", t),
            OptionValue::Str(s) => write!(f, "{}", s),
            OptionValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// Split on `:` the way option lists are written.
///
/// Trailing empty segments are dropped, an empty segment followed by a
/// non-empty one turns that one into a tag (`a::b` is `["a", :b]`), and the
/// remaining empty segments disappear.
fn to_list(value: &str) -> Vec<OptionValue> {
    let mut segments: Vec<String> = value.split(':').map(str::to_string).collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    let originally_empty: Vec<bool> = segments.iter().map(|s| s.is_empty()).collect();
    for i in 1..segments.len() {
        if originally_empty[i - 1] && !originally_empty[i] {
            segments[i].insert(0, ':');
        }
    }

    segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| OptionValue::parse(Some(s)))
        .collect()
}

/// One parsed `EXT:KEY[:VALUE]` assignment
#[derive(Debug, Clone, PartialEq)]
pub struct OptionAssignment {
    pub extension: String,
    pub key: String,
    pub value: OptionValue,
}

impl OptionAssignment {
    /// Split an assignment into extension, key and converted value.
    ///
    /// The extension is returned as written; resolving it against the
    /// registry is the caller's job.
    pub fn parse(raw: &str) -> LiveBuildResult<Self> {
        let mut parts = raw.splitn(3, ':');
        let extension = parts.next().unwrap_or_default().trim().to_string();
        let key = match parts.next() {
            Some(k) if !k.trim().is_empty() => k.trim().to_string(),
            _ => {
                return Err(LiveBuildError::configuration(format!(
                    "The option key is missing in '{}'. Set compiler options like this:\n\
                     -o coffee:bare -o haml:format::xhtml",
                    raw
                )))
            }
        };
        if extension.is_empty() {
            return Err(LiveBuildError::configuration(format!(
                "The option extension is missing in '{}'",
                raw
            )));
        }
        let value = OptionValue::parse(parts.next());
        Ok(Self {
            extension,
            key,
            value,
        })
    }
}
