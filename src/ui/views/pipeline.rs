use std::path::Path;

use livebuild::compiler::strip_colors;
use livebuild::fs::short_path;
use livebuild::PipelineEvent;

/// Where a rendered line goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Rendering switches for human output
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Only compile errors are shown
    pub quiet: bool,
    pub keep_colors: bool,
}

/// Render one event as human output, `None` when the event is silent.
///
/// `width` is the basename column width of the current compile; it is set by
/// `CompileStarted` and used to align the `Updated` lines that follow.
pub fn render_pipeline_event(
    timestamp: &str,
    event: &PipelineEvent,
    width: &mut usize,
    options: RenderOptions,
) -> Option<(Stream, String)> {
    let prefix = format!("[{}]", timestamp);

    match event {
        PipelineEvent::MonitorStarted { .. } if !options.quiet => Some((
            Stream::Stdout,
            format!("\n{} Press Ctrl-C to stop monitoring\n", prefix),
        )),
        PipelineEvent::CompileStarted { source, outputs } => {
            *width = std::iter::once(source)
                .chain(outputs)
                .map(|f| basename(f).chars().count())
                .max()
                .unwrap_or(0);
            if options.quiet {
                return None;
            }
            Some((
                Stream::Stdout,
                format!("\n{} {}\n", prefix, status_line("Compile", source, *width)),
            ))
        }
        PipelineEvent::Updated { path } if !options.quiet => Some((
            Stream::Stdout,
            format!("{} {}\n", prefix, status_line("Updated", path, *width)),
        )),
        PipelineEvent::CompileFailed {
            source,
            line,
            message,
            ..
        } => {
            let mut out = String::new();
            if options.quiet {
                out.push_str(&format!("\n{} {}\n", prefix, status_line("Compile", source, 0)));
            }
            match line {
                Some(line) => out.push_str(&format!("{} Error on line {}:\n", prefix, line)),
                None => out.push_str(&format!("{} Error:\n", prefix)),
            }
            let message = if options.keep_colors {
                message.clone()
            } else {
                strip_colors(message)
            };
            out.push_str(&message);
            out.push('\n');
            Some((Stream::Stderr, out))
        }
        PipelineEvent::Shutdown if !options.quiet => Some((Stream::Stdout, "\n".to_string())),
        _ => None,
    }
}

/// `Compile: a.coffee (~/www)` with the basename padded to `width`
fn status_line(status: &str, file: &str, width: usize) -> String {
    let path = Path::new(file);
    let dir = short_path(path.parent().unwrap_or_else(|| Path::new("")));
    format!("{}: {:<width$} ({})", status, basename(file), dir, width = width)
}

fn basename(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}
