use std::path::PathBuf;

use clap::Parser;

use livebuild::Config;

/// livebuild - monitors web templates, compiles them on updates and reloads
/// the browser
#[derive(Parser, Debug)]
#[command(name = "livebuild")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:\n  livebuild .:/www sass:/www/css README.md:/www/index.html\n  \
                        livebuild -c coffee -c sass,scss -o haml:format::xhtml .")]
pub struct Cli {
    /// Files and directories to monitor, as SOURCE or SOURCE:COMPILED
    #[arg(value_name = "SOURCE[:COMPILED]")]
    pub sources: Vec<String>,

    /// Exit after the initial compilation
    #[arg(long)]
    pub no_monitor: bool,

    /// Compile the given file types only
    #[arg(short, long, value_name = "EXT,EXT", value_delimiter = ',')]
    pub compile: Vec<String>,

    /// Disable compilation
    #[arg(long, conflicts_with = "compile")]
    pub no_compile: bool,

    /// Force recompilation at startup
    #[arg(short, long)]
    pub force: bool,

    /// Make source maps if the compiler supports it
    #[arg(short = 'm', long)]
    pub source_map: bool,

    /// Set a compiler option, e.g. `-o haml:format::xhtml`
    #[arg(short = 'o', long = "option", value_name = "EXT:KEY:VAL")]
    pub options: Vec<String>,

    /// File types whose updates trigger a reload
    #[arg(short, long, value_name = "EXT,EXT", value_delimiter = ',')]
    pub reload: Vec<String>,

    /// Disable reloading
    #[arg(long, conflicts_with = "reload")]
    pub no_reload: bool,

    /// Browsers to reload [all by default]
    #[arg(short, long = "browser", value_name = "BRO,BRO", value_delimiter = ',')]
    pub browsers: Vec<String>,

    /// Reload tabs whose url starts with URL ("localhost" by default, "all"
    /// for every tab)
    #[arg(short, long = "url", value_name = "URL,URL", value_delimiter = ',')]
    pub urls: Vec<String>,

    /// Program run with the browsers and urls appended to reload
    #[arg(long, value_name = "COMMAND")]
    pub reload_command: Option<String>,

    /// Configuration file [default: ./livebuild.toml, then
    /// ~/.config/livebuild/config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output events as NDJSON
    #[arg(long)]
    pub json: bool,

    /// List the supported file types and browsers
    #[arg(short, long)]
    pub list: bool,
}

impl Cli {
    /// Apply the command line on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if !self.sources.is_empty() {
            config.paths.sources = self.sources.clone();
        }
        if self.no_monitor {
            config.watch.monitor = false;
        }
        if self.force {
            config.watch.force = true;
        }

        if self.no_compile {
            config.compile.enabled = false;
        } else if !self.compile.is_empty() {
            config.compile.enabled = true;
            config.compile.extensions = self.compile.clone();
        }
        if self.source_map {
            config.compile.source_map = true;
        }
        config.compile.options.extend(self.options.iter().cloned());

        if self.no_reload {
            config.reload.enabled = false;
        } else if !self.reload.is_empty() {
            config.reload.enabled = true;
            config.reload.extensions = self.reload.clone();
        }
        if !self.browsers.is_empty() {
            config.reload.browsers = self.browsers.clone();
        }
        if !self.urls.is_empty() {
            config.reload.urls = self.urls.clone();
        }
        if let Some(command) = &self.reload_command {
            config.reload.command = command.split_whitespace().map(str::to_string).collect();
        }
    }
}
