//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LiveBuildError, LiveBuildResult};

use super::types::Config;

/// File name of the project configuration
pub const PROJECT_CONFIG: &str = "livebuild.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// A loaded configuration and where it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
    pub file: Option<PathBuf>,
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> LiveBuildResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;
    parse_with_warnings(&content, path)
}

pub(crate) fn parse_with_warnings(
    content: &str,
    path: &Path,
) -> LiveBuildResult<(Config, Vec<ConfigWarning>)> {
    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| LiveBuildError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load the explicit config file, else the project config, else the user
/// config, else defaults. Environment overrides are applied on top.
pub fn load_or_default(
    explicit: Option<&Path>,
    project_root: Option<&Path>,
) -> LiveBuildResult<LoadedConfig> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => project_root
            .map(|root| root.join(PROJECT_CONFIG))
            .into_iter()
            .chain(dirs_config_dir().map(|dir| dir.join("livebuild/config.toml")))
            .filter(|path| path.is_file())
            .collect(),
    };

    let Some(file) = candidates.into_iter().next() else {
        return Ok(LoadedConfig {
            config: with_env_overrides(Config::default()),
            ..LoadedConfig::default()
        });
    };

    let (config, warnings) = load_with_warnings(&file)?;
    Ok(LoadedConfig {
        config: with_env_overrides(config),
        warnings,
        file: Some(file),
    })
}

/// Apply environment variable overrides (LIVEBUILD_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`
pub fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    let flag = |key: &str| lookup(key).map(|val| val.to_lowercase() != "false" && val != "0");
    let list = |key: &str| {
        lookup(key).map(|val| {
            val.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
    };

    if let Some(force) = flag("LIVEBUILD_FORCE") {
        config.watch.force = force;
    }
    if let Some(monitor) = flag("LIVEBUILD_MONITOR") {
        config.watch.monitor = monitor;
    }
    if let Some(source_map) = flag("LIVEBUILD_SOURCE_MAP") {
        config.compile.source_map = source_map;
    }
    if let Some(reload) = flag("LIVEBUILD_RELOAD") {
        config.reload.enabled = reload;
    }
    if let Some(browsers) = list("LIVEBUILD_BROWSERS") {
        config.reload.browsers = browsers;
    }
    if let Some(urls) = list("LIVEBUILD_URLS").filter(|urls| !urls.is_empty()) {
        config.reload.urls = urls;
    }

    config
}

/// Get XDG config directory
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "watch",
        "monitor",
        "force",
        "compile",
        "enabled",
        "extensions",
        "source_map",
        "options",
        "reload",
        "browsers",
        "urls",
        "command",
        "delay_ms",
        "paths",
        "sources",
        "compilers",
        "name",
        "output",
        "family",
        "program",
        "args",
        "requires",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ac) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, bc) in b.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
