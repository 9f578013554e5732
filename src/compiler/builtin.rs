//! Command-backed adapters
//!
//! Every built-in compiler is an external program. The source is passed as a
//! path argument or piped to stdin, and the output is read from stdout (or
//! from a scratch directory when a source map is requested).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use super::library::LibraryRequirement;
use super::{
    AdapterRef, CompilerAdapter, Family, TransformContext, TransformFailure, Transformed,
};
use crate::fs::{normalized_extension, replace_extension};
use crate::options::{OptionValue, OptionsMap};

const SOURCE: &str = "{source}";
const COMPILED: &str = "{compiled}";
const OUT_DIR: &str = "{out_dir}";
const OUTPUT: &str = "{output}";

/// How an adapter produces a source map.
///
/// When the option `key` is enabled the program runs with `args` instead of
/// its regular arguments. `{out_dir}` is a scratch directory and `{output}`
/// the compiled file inside it; the program must write the compiled file
/// there and the map next to it as `<output>.map`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapSpec {
    pub key: String,
    pub args: Vec<String>,
}

/// An adapter that runs an external program
#[derive(Debug, Clone)]
pub struct CommandAdapter {
    name: String,
    family: Family,
    compiled_extension: String,
    program: String,
    args: Vec<String>,
    extension_args: BTreeMap<String, Vec<String>>,
    local_options: Vec<String>,
    libraries: Vec<LibraryRequirement>,
    source_map: Option<SourceMapSpec>,
}

impl CommandAdapter {
    /// An adapter running `program` with the family's compiled extension.
    /// The program itself is declared as a library requirement.
    pub fn new(name: impl Into<String>, family: Family, program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            name: name.into(),
            family,
            compiled_extension: family.compiled_extension().to_string(),
            libraries: vec![LibraryRequirement::new(program.clone())],
            program,
            args: Vec::new(),
            extension_args: BTreeMap::new(),
            local_options: Vec::new(),
            source_map: None,
        }
    }

    /// Arguments before the option flags. `{source}` and `{compiled}` are
    /// replaced by the paths; without `{source}` the text goes to stdin.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn compiled_extension(mut self, ext: impl Into<String>) -> Self {
        self.compiled_extension = normalized_extension(ext.into());
        self
    }

    /// Extra arguments for sources with extension `ext`
    pub fn extension_args<I, S>(mut self, ext: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extension_args.insert(
            normalized_extension(ext),
            args.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Replace the declared libraries
    pub fn requires(mut self, libraries: Vec<LibraryRequirement>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn source_map(mut self, spec: SourceMapSpec) -> Self {
        self.source_map = Some(spec);
        self
    }

    /// Options consumed by a wrapping adapter instead of the program
    fn local_options<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_options = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn into_ref(self) -> AdapterRef {
        Arc::new(self)
    }

    fn option_args(&self, options: &OptionsMap) -> Vec<String> {
        let source_map_key = self.source_map.as_ref().map(|s| s.key.as_str());
        let mut args = Vec::new();
        for (key, value) in options {
            if Some(key.as_str()) == source_map_key || self.local_options.contains(key) {
                continue;
            }
            match value {
                OptionValue::Bool(true) => args.push(format!("--{}", key)),
                OptionValue::Bool(false) => {}
                other => args.extend(
                    other
                        .to_args()
                        .into_iter()
                        .map(|value| format!("--{}={}", key, value)),
                ),
            }
        }
        args
    }

    fn run(
        &self,
        args: &[String],
        ctx: &TransformContext<'_>,
        placeholders: &[(&str, String)],
    ) -> Result<String, TransformFailure> {
        let piped = !args.iter().any(|a| a.contains(SOURCE));
        let args: Vec<String> = args
            .iter()
            .map(|arg| {
                placeholders
                    .iter()
                    .fold(arg.clone(), |arg, (name, value)| arg.replace(name, value))
            })
            .collect();

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(if piped { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            TransformFailure::new(format!("Failed to run {}: {}", self.program, e))
        })?;

        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = child.stdin.take() {
                let text = ctx.source_text;
                scope.spawn(move || {
                    // The program may exit without reading everything
                    let _ = stdin.write_all(text.as_bytes());
                });
            }
            child.wait_with_output()
        })
        .map_err(|e| TransformFailure::new(format!("Failed to run {}: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let message = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            format!("{} exited with {}", self.program, output.status)
        };
        Err(TransformFailure::new(message))
    }

    fn base_args(&self, source_file: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(extra) = self.extension_args.get(&normalized_extension(source_file)) {
            args.extend(extra.iter().cloned());
        }
        args
    }

    fn transform_with_map(
        &self,
        spec: &SourceMapSpec,
        ctx: &TransformContext<'_>,
    ) -> Result<Transformed, TransformFailure> {
        let scratch = tempfile::tempdir()
            .map_err(|e| TransformFailure::new(format!("Failed to create scratch dir: {}", e)))?;
        let file_name = ctx
            .source_file
            .file_name()
            .map(Path::new)
            .unwrap_or(ctx.source_file);
        let output = scratch
            .path()
            .join(replace_extension(file_name, &self.compiled_extension));

        let mut args = spec.args.clone();
        args.extend(self.option_args(ctx.options));
        let placeholders = [
            (SOURCE, ctx.source_file.display().to_string()),
            (COMPILED, ctx.compiled_file.display().to_string()),
            (OUT_DIR, scratch.path().display().to_string()),
            (OUTPUT, output.display().to_string()),
        ];
        let stdout = self.run(&args, ctx, &placeholders)?;

        let text = std::fs::read_to_string(&output).unwrap_or(stdout);
        let mut map_file = output.into_os_string();
        map_file.push(".map");
        let transformed = Transformed::new(text);
        Ok(match std::fs::read_to_string(&map_file) {
            Ok(map) => transformed.with_source_map(map),
            Err(_) => transformed,
        })
    }
}

impl CompilerAdapter for CommandAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> Family {
        self.family
    }

    fn compiled_extension(&self) -> &str {
        &self.compiled_extension
    }

    fn libraries(&self) -> Vec<LibraryRequirement> {
        self.libraries.clone()
    }

    fn source_map_key(&self) -> Option<&str> {
        self.source_map.as_ref().map(|s| s.key.as_str())
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<Transformed, TransformFailure> {
        if let (Some(spec), Some(_)) = (&self.source_map, ctx.source_map_file) {
            return self.transform_with_map(spec, ctx);
        }

        let mut args = self.base_args(ctx.source_file);
        args.extend(self.option_args(ctx.options));
        let placeholders = [
            (SOURCE, ctx.source_file.display().to_string()),
            (COMPILED, ctx.compiled_file.display().to_string()),
        ];
        self.run(&args, ctx, &placeholders).map(Transformed::new)
    }
}

/// Markdown through pandoc, optionally poured into an HTML layout.
///
/// The `layout` option names a template file. `{{TITLE}}` becomes the text of
/// the first `<h1>` (or the file name), `{{FILE}}` the file name and
/// `{{BODY}}` the rendered document.
#[derive(Debug, Clone)]
pub struct MarkdownAdapter {
    inner: CommandAdapter,
}

impl MarkdownAdapter {
    pub fn new() -> Self {
        let inner = CommandAdapter::new("markdown", Family::Html, "pandoc")
            .args(["--from", "markdown", "--to", "html"])
            .local_options(["layout"]);
        Self { inner }
    }
}

impl Default for MarkdownAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerAdapter for MarkdownAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn family(&self) -> Family {
        Family::Html
    }

    fn libraries(&self) -> Vec<LibraryRequirement> {
        self.inner.libraries()
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<Transformed, TransformFailure> {
        let body = self.inner.transform(ctx)?.text;
        let Some(layout) = ctx.options.get("layout").filter(|v| v.is_enabled()) else {
            return Ok(Transformed::new(body));
        };

        let layout_file = layout.to_string();
        let template = std::fs::read_to_string(&layout_file).map_err(|e| {
            TransformFailure::new(format!("Cannot read layout {}: {}", layout_file, e))
        })?;
        let file = ctx
            .source_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = first_heading(&body).unwrap_or_else(|| file.clone());

        Ok(Transformed::new(
            template
                .replace("{{TITLE}}", &title)
                .replace("{{FILE}}", &file)
                .replacen("{{BODY}}", &body, 1),
        ))
    }
}

fn first_heading(html: &str) -> Option<String> {
    let re = regex::Regex::new(r"(?s)<h1\b[^>]*>(.*?)</h1>").ok()?;
    let inner = re.captures(html)?.get(1)?.as_str();
    let tags = regex::Regex::new(r"<[^>]+>").ok()?;
    let text = tags.replace_all(inner, "");
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// The built-in adapters with the extensions they are registered for
pub fn builtin_adapters() -> Vec<(Vec<&'static str>, AdapterRef)> {
    let coffee = CommandAdapter::new("coffee", Family::Js, "coffee")
        .args(["--stdio", "--print"])
        .requires(vec![LibraryRequirement::new("coffee")
            .package("coffeescript")
            .version(">= 1.6.2")])
        .source_map(SourceMapSpec {
            key: "sourceMap".to_string(),
            args: vec![
                "--compile".to_string(),
                "--map".to_string(),
                "--output".to_string(),
                OUT_DIR.to_string(),
                SOURCE.to_string(),
            ],
        });

    let sass = CommandAdapter::new("sass", Family::Css, "sass")
        .args(["--stdin"])
        .extension_args("sass", ["--indented"]);

    let less = CommandAdapter::new("less", Family::Css, "lessc")
        .args(["-"])
        .requires(vec![LibraryRequirement::new("lessc").package("less")]);

    let haml = CommandAdapter::new("haml", Family::Html, "haml").args(["render", SOURCE]);

    vec![
        (vec!["coffee"], coffee.into_ref()),
        (vec!["sass", "scss"], sass.into_ref()),
        (vec!["less"], less.into_ref()),
        (vec!["haml"], haml.into_ref()),
        (vec!["md", "markdown"], Arc::new(MarkdownAdapter::new())),
    ]
}
