//! Tests for the config module

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::tempdir;

use super::loader::parse_with_warnings;
use super::*;
use crate::compiler::{AdapterRef, CommandAdapter, CompilerAdapter, Family};
use crate::error::LiveBuildError;
use crate::options::OptionValue;
use crate::registry::ExtensionRegistry;
use crate::reload::{KNOWN_BROWSERS, LOCALHOST};
use crate::testing::{registry_with, FakeAdapter};

fn registry() -> ExtensionRegistry {
    let coffee: AdapterRef = FakeAdapter::new("coffee", Family::Js).shared();
    let sass: AdapterRef = FakeAdapter::new("sass", Family::Css).shared();
    registry_with(&[("coffee", coffee), ("sass", sass)])
}

fn config_with_sources(sources: &[String]) -> Config {
    let mut config = Config::default();
    config.paths.sources = sources.to_vec();
    config
}

fn configuration_message(err: LiveBuildError) -> String {
    match err {
        LiveBuildError::Configuration { message } => message,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.watch.monitor);
    assert!(!config.watch.force);
    assert!(config.compile.enabled);
    assert!(config.compile.extensions.is_empty());
    assert!(!config.compile.source_map);
    assert!(config.reload.enabled);
    assert_eq!(config.reload.extensions, vec!["css", "html", "js"]);
    assert_eq!(config.reload.urls, vec!["localhost"]);
    assert_eq!(config.reload.delay_ms, 200);
    assert!(config.paths.sources.is_empty());
    assert!(config.compilers.is_empty());
}

#[test]
fn test_config_parse_toml() {
    let toml = r#"
[watch]
monitor = false
force = true

[compile]
extensions = ["coffee"]
source_map = true
options = ["coffee:bare", "haml:format::xhtml"]

[reload]
browsers = ["safari"]
urls = ["all"]
command = ["osascript", "reload.scpt"]
delay_ms = 50

[paths]
sources = ["src:www"]

[[compilers]]
name = "typescript"
extensions = ["ts"]
output = "js"
family = "js"
program = "tsc"
args = ["--stdin"]
requires = [{ library = "tsc", package = "typescript", version = ">= 5" }]
"#;

    let (config, warnings) = parse_with_warnings(toml, Path::new("livebuild.toml")).unwrap();

    assert!(warnings.is_empty());
    assert!(!config.watch.monitor);
    assert!(config.watch.force);
    assert_eq!(config.compile.extensions, vec!["coffee"]);
    assert!(config.compile.source_map);
    assert_eq!(config.compile.options.len(), 2);
    assert_eq!(config.reload.browsers, vec!["safari"]);
    assert_eq!(config.reload.command, vec!["osascript", "reload.scpt"]);
    assert_eq!(config.reload.delay_ms, 50);
    assert_eq!(config.paths.sources, vec!["src:www"]);

    let compiler = &config.compilers[0];
    assert_eq!(compiler.name, "typescript");
    assert_eq!(compiler.family, Family::Js);
    assert_eq!(compiler.output.as_deref(), Some("js"));
    assert_eq!(compiler.requires[0].package_name(), "typescript");
    assert_eq!(compiler.requires[0].version.as_deref(), Some(">= 5"));
}

#[test]
fn test_config_load_with_warnings_reports_unknown_key_with_suggestion() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("livebuild.toml");
    fs::write(&path, "[reload]\nbrowsrs = [\"Safari\"]\n").unwrap();

    let (_config, warnings) = Config::load_with_warnings(&path).unwrap();

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "browsrs");
    assert_eq!(warnings[0].line, Some(2));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("browsers"));
    assert!(warnings[0].to_string().contains("did you mean 'browsers'?"));
}

#[test]
fn test_config_invalid_toml_is_reported_with_file() {
    let err = parse_with_warnings("[watch]\nmonitor = \"yes\"\n", Path::new("bad.toml"))
        .unwrap_err();
    match err {
        LiveBuildError::InvalidConfig { file, .. } => assert_eq!(file, PathBuf::from("bad.toml")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("LIVEBUILD_FORCE", "1"),
        ("LIVEBUILD_MONITOR", "false"),
        ("LIVEBUILD_SOURCE_MAP", "yes"),
        ("LIVEBUILD_RELOAD", "0"),
        ("LIVEBUILD_BROWSERS", "Safari, Chrome,"),
        ("LIVEBUILD_URLS", ""),
    ]
    .into_iter()
    .collect();

    let config = apply_env_overrides(Config::default(), |key| {
        env.get(key).map(|v| v.to_string())
    });

    assert!(config.watch.force);
    assert!(!config.watch.monitor);
    assert!(config.compile.source_map);
    assert!(!config.reload.enabled);
    assert_eq!(config.reload.browsers, vec!["Safari", "Chrome"]);
    assert_eq!(config.reload.urls, vec!["localhost"], "empty URL list is ignored");
}

#[test]
fn test_load_or_default_prefers_explicit_then_project() {
    let dir = tempdir().unwrap();
    let project = dir.path().join(PROJECT_CONFIG);
    fs::write(&project, "[watch]\nforce = true\n").unwrap();
    let explicit = dir.path().join("other.toml");
    fs::write(&explicit, "[watch]\nmonitor = false\n").unwrap();

    let loaded = load_or_default(None, Some(dir.path())).unwrap();
    assert_eq!(loaded.file.as_deref(), Some(project.as_path()));
    assert!(loaded.config.watch.force);

    let loaded = load_or_default(Some(&explicit), Some(dir.path())).unwrap();
    assert_eq!(loaded.file.as_deref(), Some(explicit.as_path()));
    assert!(!loaded.config.watch.monitor);
    assert!(!loaded.config.watch.force);
}

#[test]
fn test_load_or_default_missing_explicit_file_fails() {
    let dir = tempdir().unwrap();
    assert!(load_or_default(Some(&dir.path().join("missing.toml")), None).is_err());
}

#[test]
fn test_resolve_requires_sources() {
    let err = Settings::resolve(&Config::default(), &registry()).unwrap_err();
    assert!(configuration_message(err).starts_with("No directory or file provided."));
}

#[test]
fn test_resolve_sorts_files_and_directories() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let www = dir.path().join("www");
    fs::create_dir_all(&src).unwrap();
    let file = dir.path().join("app.coffee");
    fs::write(&file, "x").unwrap();

    let config = config_with_sources(&[
        format!("{}:{}", src.display(), www.display()),
        file.display().to_string(),
        format!("{}/./", src.display()),
    ]);
    let settings = Settings::resolve(&config, &registry()).unwrap();

    assert_eq!(settings.source_dirs, vec![src.clone()]);
    assert_eq!(settings.source_files, vec![file.clone()]);
    assert_eq!(settings.compiled_files.get(&file), Some(&None));
    // the later plain entry replaces the mapping
    assert_eq!(settings.compiled_dirs.get(&src), Some(&None));
}

#[test]
fn test_resolve_keeps_compiled_mappings() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    let file = dir.path().join("app.coffee");
    fs::write(&file, "x").unwrap();
    let out = dir.path().join("public/app.js");

    let config = config_with_sources(&[
        format!("{}:{}", src.display(), dir.path().join("www").display()),
        format!("{}:{}", file.display(), out.display()),
    ]);
    let settings = Settings::resolve(&config, &registry()).unwrap();

    assert_eq!(settings.compiled_dirs.get(&src), Some(&Some(dir.path().join("www"))));
    assert_eq!(settings.compiled_files.get(&file), Some(&Some(out)));
}

#[test]
fn test_resolve_rejects_invalid_paths() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("app.coffee");
    fs::write(&file, "x").unwrap();
    let missing = dir.path().join("missing");

    let err = Settings::resolve(
        &config_with_sources(&[missing.display().to_string()]),
        &registry(),
    )
    .unwrap_err();
    assert_eq!(
        configuration_message(err),
        format!("No such file or directory: '{}'", missing.display())
    );

    let err = Settings::resolve(
        &config_with_sources(&[format!("{}:{}", dir.path().display(), file.display())]),
        &registry(),
    )
    .unwrap_err();
    assert!(configuration_message(err).starts_with("Expected a directory, but got a filename"));

    let err = Settings::resolve(
        &config_with_sources(&[format!("{}:{}", file.display(), dir.path().display())]),
        &registry(),
    )
    .unwrap_err();
    assert!(configuration_message(err).starts_with("Expected a filename, but got a directory"));
}

#[test]
fn test_resolve_compile_extensions() {
    let dir = tempdir().unwrap();
    let mut config = config_with_sources(&[dir.path().display().to_string()]);

    let settings = Settings::resolve(&config, &registry()).unwrap();
    assert_eq!(settings.compile_extensions, vec!["coffee", "sass"]);

    config.compile.extensions = vec![".SASS".to_string(), "sass".to_string()];
    let settings = Settings::resolve(&config, &registry()).unwrap();
    assert_eq!(settings.compile_extensions, vec!["sass"]);

    config.compile.extensions = vec!["styl".to_string()];
    let err = Settings::resolve(&config, &registry()).unwrap_err();
    let message = configuration_message(err);
    assert!(message.starts_with("No compiler registered for 'styl' files."));
    assert!(message.ends_with("coffee sass"));
}

#[test]
fn test_resolve_reload_targets() {
    let dir = tempdir().unwrap();
    let mut config = config_with_sources(&[dir.path().display().to_string()]);

    let settings = Settings::resolve(&config, &registry()).unwrap();
    assert_eq!(settings.browsers.len(), KNOWN_BROWSERS.len());
    assert_eq!(settings.reload_targets.len(), KNOWN_BROWSERS.len() + LOCALHOST.len());
    assert_eq!(settings.reload_delay, Duration::from_millis(200));

    config.reload.browsers = vec!["safari".to_string(), "Safari".to_string()];
    config.reload.urls = vec!["all".to_string()];
    let settings = Settings::resolve(&config, &registry()).unwrap();
    assert_eq!(settings.reload_targets, vec!["Safari"]);

    config.reload.browsers = vec!["lynx".to_string()];
    let err = Settings::resolve(&config, &registry()).unwrap_err();
    assert!(configuration_message(err).starts_with("Unknown browser 'lynx'."));
}

#[test]
fn test_monitor_extensions_follow_enabled_stages() {
    let dir = tempdir().unwrap();
    let mut config = config_with_sources(&[dir.path().display().to_string()]);
    config.reload.extensions = vec!["css".to_string(), "js".to_string()];
    config.compile.extensions = vec!["sass".to_string()];

    let mut settings = Settings::resolve(&config, &registry()).unwrap();
    assert_eq!(settings.monitor_extensions(), vec!["sass", "css", "js"]);

    settings.reload = false;
    assert_eq!(settings.monitor_extensions(), vec!["sass"]);

    settings.compile = false;
    assert!(settings.monitor_extensions().is_empty());
}

#[test]
fn test_configure_registry_registers_compilers_and_options() {
    let toml = r#"
[compile]
source_map = true
options = ["coffee:bare", "ts:target::es5"]

[[compilers]]
name = "typescript"
extensions = ["ts", ".TSX"]
output = "js"
family = "js"
program = "tsc"
"#;
    let (config, _) = parse_with_warnings(toml, Path::new("livebuild.toml")).unwrap();
    let mut registry = registry();
    registry.register(
        "haml",
        CommandAdapter::new("haml", Family::Html, "haml").into_ref(),
    );

    configure_registry(&config, &mut registry).unwrap();

    let ts = registry.lookup("app.tsx").unwrap();
    assert_eq!(ts.name(), "typescript");
    assert_eq!(ts.compiled_extension(), "js");
    assert_eq!(
        registry.options_for("typescript").get("target"),
        Some(&OptionValue::Tag("es5".to_string()))
    );
    assert_eq!(
        registry.options_for("coffee").get("bare"),
        Some(&OptionValue::Bool(true))
    );
}

#[test]
fn test_configure_registry_rejects_unknown_option_extension() {
    let mut config = Config::default();
    config.compile.options = vec!["styl:compress".to_string()];
    let mut registry = registry();
    assert!(configure_registry(&config, &mut registry).is_err());
}

#[test]
fn test_configure_registry_rejects_compiler_without_extensions() {
    let mut config = Config::default();
    config.compilers.push(CompilerConfig {
        name: "tsc".to_string(),
        extensions: Vec::new(),
        output: None,
        family: Family::Js,
        program: "tsc".to_string(),
        args: Vec::new(),
        requires: Vec::new(),
    });
    let mut registry = registry();
    assert!(configure_registry(&config, &mut registry).is_err());
}
