//! Path and file helpers
//!
//! Extension normalization, compiled-path derivation, the staleness check and
//! the atomic writer used for every compiled artifact.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::LiveBuildResult;

/// Normalize a file name or bare extension.
///
/// `"/dir/a style.css.sass"`, `".sass"`, `" SASS "` and `"sass"` all
/// normalize to `"sass"`. A name without a dot is taken whole.
pub fn normalized_extension(file: impl AsRef<Path>) -> String {
    let file = file.as_ref();
    let raw = match file.extension() {
        Some(ext) if !ext.is_empty() => ext.to_string_lossy().into_owned(),
        _ => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string_lossy().into_owned()),
    };
    raw.replace('.', "").trim().to_lowercase()
}

/// Replace the final extension of `file` with `ext`.
///
/// The new extension is not appended twice (`script.js.coffee` becomes
/// `script.js`), and an empty `ext` leaves the bare stem.
pub fn replace_extension(file: &Path, ext: &str) -> PathBuf {
    let mut name = file.to_string_lossy().into_owned();
    if let Some(current) = file.extension() {
        let suffix = format!(".{}", current.to_string_lossy());
        if name.ends_with(&suffix) {
            name.truncate(name.len() - suffix.len());
        }
    }
    if !ext.is_empty() {
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{}", ext)
        };
        if !name.ends_with(&ext) {
            name.push_str(&ext);
        }
    }
    PathBuf::from(name)
}

/// Move `file` into `dir`, keeping only its basename.
///
/// `None` keeps the file where it is; an empty directory drops the directory
/// part entirely.
pub fn replace_directory(file: &Path, dir: Option<&Path>) -> PathBuf {
    let Some(dir) = dir else {
        return file.to_path_buf();
    };
    let base = file
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| file.to_path_buf());
    if dir.as_os_str().is_empty() {
        base
    } else {
        dir.join(base)
    }
}

/// Absolute, lexically normalized form of `path` (no symlink resolution).
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expand a leading `~` and make the path absolute.
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(raw),
        },
        _ => PathBuf::from(raw),
    };
    absolute(&expanded)
}

/// Replace the home directory prefix with `~` for display.
pub fn short_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

/// Path of `to_file` relative to the directory containing `from_file`.
pub fn relative_path(from_file: &Path, to_file: &Path) -> PathBuf {
    let from = from_file.parent().unwrap_or_else(|| Path::new(""));
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to_file.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    out
}

/// True iff `file` exists and is at least as new as `compared_to`.
///
/// Equal timestamps count as up to date. A missing `compared_to` with an
/// existing `file` is also up to date: there is nothing to rebuild from.
pub fn is_up_to_date(file: &Path, compared_to: &Path) -> bool {
    let Ok(compiled) = std::fs::metadata(file).and_then(|m| m.modified()) else {
        return false;
    };
    match std::fs::metadata(compared_to).and_then(|m| m.modified()) {
        Ok(source) => compiled >= source,
        Err(_) => true,
    }
}

/// Write `text` to `path` atomically, creating parent directories.
///
/// The content goes to a temp file in the same directory which is then
/// renamed over `path`.
pub fn write_file(path: &Path, text: &str) -> LiveBuildResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
