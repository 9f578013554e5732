//! Browser-facing renderings of compile errors
//!
//! When a compile fails the compiled file is overwritten with something the
//! browser will display: a stylesheet that paints the error over the page, a
//! script that injects it, or a whole error page.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::CompileError;
use crate::fs::short_path;

/// How a compile error is written into the compiled file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorRenderKind {
    /// The normalized message, unchanged
    Plain,
    Css,
    Js,
    Html,
}

static ANSI_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[\d;]+m(.*?)\x1b\[0*m").unwrap());
static ANSI_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[\d;]*m").unwrap());

const PLACEHOLDER: &str = "{{message}}";

const CSS_TEMPLATE: &str = r#"html {
  background: #fff;
}
body:before {
  display: block;
  position: fixed;
  top: 0;
  left: 0;
  right: 0;
  z-index: 99999;
  padding: 1em 1.5em;
  font: 14px/1.5 monospace;
  white-space: pre-wrap;
  color: #b00;
  background: #fee;
  border-bottom: 2px solid #b00;
  content: "{{message}}";
}
"#;

const JS_TEMPLATE: &str = r#"(function() {
  var message = "{{message}}";
  var show = function() {
    var box = document.createElement('div');
    box.style.cssText = 'position:fixed;top:0;left:0;right:0;z-index:99999;' +
      'padding:1em 1.5em;font:14px/1.5 monospace;white-space:pre-wrap;' +
      'color:#b00;background:#fee;border-bottom:2px solid #b00';
    box.innerHTML = message;
    document.body.insertBefore(box, document.body.firstChild);
  };
  if (document.body) {
    show();
  } else {
    window.addEventListener('DOMContentLoaded', show);
  }
  throw new Error(message.replace(/<[^>]*>/g, ''));
})();
"#;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Compile error</title>
</head>
<body>
<script>
{{message}}</script>
</body>
</html>
"#;

/// Render `error` for writing into the compiled file
pub fn render(kind: ErrorRenderKind, error: &CompileError) -> String {
    match kind {
        ErrorRenderKind::Plain => error.message().to_string(),
        ErrorRenderKind::Css => {
            let body = browser_body(error, error.message(), false).replace('\n', "\\a ");
            fill(CSS_TEMPLATE, &body)
        }
        ErrorRenderKind::Js => render_js(error),
        ErrorRenderKind::Html => fill(HTML_TEMPLATE, &render_js(error)),
    }
}

fn render_js(error: &CompileError) -> String {
    let escaped = escape_html(error.message());
    let body = browser_body(error, &escaped, true).replace('\n', "<br>");
    fill(JS_TEMPLATE, &body)
}

fn fill(template: &str, body: &str) -> String {
    template.replacen(PLACEHOLDER, body, 1)
}

fn browser_body(error: &CompileError, message: &str, html_allowed: bool) -> String {
    let mut body = escape_string(&strip_ansi(message, html_allowed));
    body.push_str("\n\n");
    if let Some(line) = error.line() {
        body.push_str(&format!("Line: {}\n", line));
    }
    let file = short_path(error.file());
    let basename = Path::new(&file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.clone());
    body.push_str(&format!(
        "File: {} ({})",
        escape_string(&basename),
        escape_string(&file)
    ));
    body
}

/// Remove terminal color codes from a compiler message
pub fn strip_colors(message: &str) -> String {
    strip_ansi(message, false)
}

/// Drop terminal colors. Colored runs become `<span>` elements when the
/// target can display HTML.
fn strip_ansi(message: &str, html_allowed: bool) -> String {
    let replacement = if html_allowed { "<span>$1</span>" } else { "$1" };
    let spans = ANSI_SPAN.replace_all(message, replacement);
    ANSI_CODE.replace_all(&spans, "").into_owned()
}

/// Escape for a double-quoted string literal
fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
