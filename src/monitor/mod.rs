//! File monitor
//!
//! Watches explicit files plus every file below the monitored directories
//! whose extension is enabled. A timestamp snapshot decides which files
//! actually changed when the OS reports activity in a directory.
//!
//! - Snapshot: [`Monitor::files`] walks everything and records mtimes
//! - Watch: [`Monitor::monitor`] blocks, rescanning reported directories and
//!   calling back once per changed file


use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant, SystemTime};

use ignore::WalkBuilder;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use regex::Regex;
use tracing::debug;

use crate::error::{LiveBuildError, LiveBuildResult};
use crate::fs::absolute;

/// How long a burst of notifications may settle before rescanning
pub const LATENCY: Duration = Duration::from_millis(100);

const POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct Monitor {
    files: BTreeSet<PathBuf>,
    directories: Vec<PathBuf>,
    pattern: Option<Regex>,
    timestamps: BTreeMap<PathBuf, SystemTime>,
    latency: Duration,
}

impl Monitor {
    /// Monitor `files`, and every file below `directories` with one of
    /// `extensions`.
    ///
    /// The directories actually walked are `directories` plus the parents of
    /// `files`, with nested entries removed. With no directories or no
    /// extensions only the explicit files are monitored. Relative paths are
    /// taken from the working directory.
    pub fn new(files: &[PathBuf], directories: &[PathBuf], extensions: &[String]) -> Self {
        let files: Vec<PathBuf> = files.iter().map(|f| absolute(f)).collect();
        let directories: Vec<PathBuf> = directories.iter().map(|d| absolute(d)).collect();

        let pattern = pattern(&directories, extensions);
        let mut all = directories.clone();
        all.extend(files.iter().filter_map(|f| f.parent().map(Path::to_path_buf)));

        Self {
            files: files.into_iter().collect(),
            directories: delete_nested(&all),
            pattern,
            timestamps: BTreeMap::new(),
            latency: LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Directories that are walked and watched
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Rebuild the snapshot and return every monitored file
    pub fn files(&mut self) -> LiveBuildResult<Vec<PathBuf>> {
        self.snapshot()?;
        Ok(self.timestamps.keys().cloned().collect())
    }

    /// Whether `file` is monitored, by name or by pattern
    pub fn is_monitored(&self, file: &Path) -> bool {
        if self.files.contains(file) {
            return true;
        }
        match &self.pattern {
            Some(re) => re.is_match(&file.to_string_lossy()) && file.is_file(),
            None => false,
        }
    }

    fn snapshot(&mut self) -> LiveBuildResult<()> {
        let mut timestamps = BTreeMap::new();
        for dir in &self.directories {
            self.walk(dir, |file, mtime| {
                timestamps.insert(file, mtime);
            })?;
        }
        self.timestamps = timestamps;
        Ok(())
    }

    /// Rescan `dirs` and return the monitored files whose mtime differs from
    /// the snapshot, updating it. Files that disappeared are forgotten.
    pub fn scan_changes(&mut self, dirs: &[PathBuf]) -> LiveBuildResult<Vec<PathBuf>> {
        let dirs = delete_nested(dirs);
        let mut seen = BTreeMap::new();
        for dir in &dirs {
            self.walk(dir, |file, mtime| {
                seen.insert(file, mtime);
            })?;
        }

        self.timestamps
            .retain(|file, _| seen.contains_key(file) || !dirs.iter().any(|d| file.starts_with(d)));

        let mut changed = Vec::new();
        for (file, mtime) in seen {
            if self.timestamps.get(&file) != Some(&mtime) {
                self.timestamps.insert(file.clone(), mtime);
                changed.push(file);
            }
        }
        Ok(changed)
    }

    fn walk(&self, dir: &Path, mut visit: impl FnMut(PathBuf, SystemTime)) -> LiveBuildResult<()> {
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_not_found(&err) => continue,
                Err(err) => return Err(LiveBuildError::monitor(Some(dir.to_path_buf()), err)),
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.into_path();
            if !self.is_monitored(&path) {
                continue;
            }
            match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => visit(path, mtime),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(LiveBuildError::MonitorIo {
                        path: Some(path),
                        source: err,
                    })
                }
            }
        }
        Ok(())
    }

    /// Monitored directory (or part of one) to rescan for an event path
    fn rescan_dirs(&self, path: &Path) -> Vec<PathBuf> {
        let dir = if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        };
        if self.directories.iter().any(|d| dir.starts_with(d)) {
            return vec![dir];
        }
        self.directories
            .iter()
            .filter(|d| d.starts_with(&dir))
            .cloned()
            .collect()
    }

    /// Block until `running` is cleared, calling `callback` once per changed
    /// monitored file. Errors from the callback end the watch.
    pub fn monitor<F>(&mut self, running: &AtomicBool, mut callback: F) -> LiveBuildResult<()>
    where
        F: FnMut(&Path) -> LiveBuildResult<()>,
    {
        self.snapshot()?;

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .map_err(|e| LiveBuildError::monitor(None, e))?;

        for dir in &self.directories {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|e| LiveBuildError::monitor(Some(dir.clone()), e))?;
        }

        let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
        let mut last_event: Option<Instant> = None;

        while running.load(Ordering::SeqCst) {
            match rx.recv_timeout(POLL) {
                Ok(Ok(event)) => {
                    for path in &event.paths {
                        pending.extend(self.rescan_dirs(path));
                    }
                    last_event = Some(Instant::now());
                }
                Ok(Err(err)) => {
                    return Err(LiveBuildError::monitor(err.paths.first().cloned(), err));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let settled = last_event.is_some_and(|t| t.elapsed() >= self.latency);
            if !settled {
                continue;
            }
            last_event = None;
            if pending.is_empty() {
                continue;
            }

            let dirs: Vec<PathBuf> = std::mem::take(&mut pending).into_iter().collect();
            debug!(dirs = ?dirs, "rescanning");
            for file in self.scan_changes(&dirs)? {
                callback(&file)?;
            }
        }

        Ok(())
    }
}

fn is_not_found(err: &ignore::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == ErrorKind::NotFound)
}

/// Drop every directory that lies inside another one, and duplicates.
/// Nesting is decided per path component: `/www` contains `/www/css` but not
/// `/www2`.
pub fn delete_nested(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        let nested = dirs.iter().any(|other| other != dir && dir.starts_with(other));
        if !nested && !kept.contains(dir) {
            kept.push(dir.clone());
        }
    }
    kept
}

fn pattern(dirs: &[PathBuf], extensions: &[String]) -> Option<Regex> {
    if dirs.is_empty() || extensions.is_empty() {
        return None;
    }
    let dirs: Vec<String> = delete_nested(dirs)
        .iter()
        .map(|d| {
            let d = d.to_string_lossy();
            regex::escape(d.trim_end_matches(MAIN_SEPARATOR))
        })
        .collect();
    let exts: Vec<String> = extensions.iter().map(|e| regex::escape(e)).collect();

    let separator = regex::escape(&MAIN_SEPARATOR.to_string());
    Regex::new(&format!(
        r"^({}){}.*\.({})$",
        dirs.join("|"),
        separator,
        exts.join("|")
    ))
    .ok()
}
