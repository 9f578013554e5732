use std::cell::Cell;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use livebuild::config::{configure_registry, load_or_default, Settings};
use livebuild::{reloader_for, ExtensionRegistry, Orchestrator, PipelineEvent};

use crate::cli::Cli;
use crate::ui::output::print_config_warnings;
use crate::ui::terminal::keep_colors;
use crate::ui::views::pipeline::{render_pipeline_event, RenderOptions, Stream};

pub fn cmd_run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot read the working directory")?;
    let loaded = load_or_default(cli.config.as_deref(), Some(&cwd))?;
    if let Some(file) = &loaded.file {
        debug!(file = %file.display(), "loaded configuration");
    }
    if !cli.json {
        print_config_warnings(&loaded.warnings);
    }

    let mut config = loaded.config;
    cli.apply(&mut config);

    let mut registry = ExtensionRegistry::with_builtins();
    configure_registry(&config, &mut registry)?;

    if cli.list {
        super::list::cmd_list(&registry);
        return Ok(());
    }

    let settings = Settings::resolve(&config, &registry)?;
    let reloader = reloader_for(&settings)?;
    let orchestrator = Orchestrator::new(settings, Arc::new(registry), reloader);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("cannot install the Ctrl-C handler")?;

    let options = RenderOptions {
        quiet: cli.quiet,
        keep_colors: keep_colors(),
    };
    let width = Cell::new(0);
    let json = cli.json;

    orchestrator.run(running, |event| {
        if json {
            println!("{}", event.to_json());
            return;
        }
        print_event(&event, &width, options);
    })?;

    Ok(())
}

fn print_event(event: &PipelineEvent, width: &Cell<usize>, options: RenderOptions) {
    let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
    let mut current = width.get();
    let rendered = render_pipeline_event(&timestamp, event, &mut current, options);
    width.set(current);

    match rendered {
        Some((Stream::Stdout, text)) => {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        Some((Stream::Stderr, text)) => eprint!("{text}"),
        None => {}
    }
}
