mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, GlobalArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::error;
use wallkeeper_core::config::{self, AppConfig};
use wallkeeper_core::{
    Classification, Confirmation, Outcome, Roots, SyncAction, SyncEngine, OVERLAY_PRIORITY,
};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let mut config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    apply_overrides(&mut config, &args.globals);

    let roots = Roots::resolve(&config).context("resolving wallpaper folders")?;
    let mut engine = SyncEngine::from_config(&config, roots);
    if args.globals.interactive {
        engine = engine.with_confirmation(PromptConfirmation);
    }

    match args.command {
        Some(Commands::Classify { paths }) => run_classify(&engine, &paths),
        Some(Commands::Menu { paths }) => run_menu(&engine, &paths),
        Some(Commands::Overlay { path }) => run_overlay(&engine, &path),
        Some(Commands::List) => run_list(&engine),
        Some(Commands::Add { paths }) => run_sync(&engine, SyncAction::Add, &paths)?,
        Some(Commands::Remove { paths }) => run_sync(&engine, SyncAction::Remove, &paths)?,
        Some(Commands::Locate { paths }) => {
            run_sync(&engine, SyncAction::LocateSource, &paths)?
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            println!("Roots: {:?}", engine.roots());
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, globals: &GlobalArgs) {
    if let Some(root) = &globals.source_root {
        config.source_root = Some(root.to_string_lossy().into_owned());
    }
    if let Some(root) = &globals.derived_root {
        config.derived_root = Some(root.to_string_lossy().into_owned());
    }
}

fn paint(classification: Classification) -> ColoredString {
    let label = classification.to_string();
    match classification {
        Classification::Addable => label.green(),
        Classification::Removable => label.yellow(),
        Classification::SourceLookupable => label.cyan(),
        Classification::Unmanaged => label.dimmed(),
    }
}

fn run_classify(engine: &SyncEngine, paths: &[PathBuf]) {
    let index = engine.load_index();
    let resolver = engine.resolver(&index);
    for path in paths {
        println!("{:>18}  {}", paint(resolver.classify(path)), path.display());
    }
}

fn run_menu(engine: &SyncEngine, paths: &[PathBuf]) {
    let index = engine.load_index();
    let actions = engine.resolver(&index).menu_actions(paths);
    if actions.is_empty() {
        println!("{}", "No wallpaper actions for this selection".dimmed());
        return;
    }
    if actions.add {
        println!("{}", SyncAction::Add);
    }
    if actions.remove {
        println!("{}", SyncAction::Remove);
    }
    if actions.goto_source {
        println!("{}", SyncAction::LocateSource);
    }
}

fn run_overlay(engine: &SyncEngine, path: &Path) {
    let index = engine.load_index();
    let shown = engine.resolver(&index).show_overlay(path);
    let state = if shown { "shown".green() } else { "hidden".dimmed() };
    println!("{} (priority {})", state, OVERLAY_PRIORITY);
}

fn run_list(engine: &SyncEngine) {
    let index = engine.load_index();
    for stem in index.stems() {
        println!("{}", stem);
    }
    println!(
        "{} wallpapers in {}",
        format!("{}", index.len()).cyan(),
        index.root().display()
    );
}

fn run_sync(engine: &SyncEngine, action: SyncAction, paths: &[PathBuf]) -> anyhow::Result<()> {
    let reporter = CliReporter::new();
    let report = engine.apply(action, paths, &reporter);

    for (path, outcome) in &report.completed {
        match outcome {
            Outcome::Added(dest) => {
                println!("{} {} -> {}", "added".green(), path.display(), dest.display())
            }
            Outcome::Removed(dest) => println!("{} {}", "removed".yellow(), dest.display()),
            Outcome::Located(found) => {
                for source in found {
                    println!("{} {}", "source".cyan(), source.display());
                }
            }
        }
    }
    for (path, classification) in &report.skipped {
        println!(
            "{} {} ({})",
            "skipped".dimmed(),
            path.display(),
            classification
        );
    }
    for path in &report.declined {
        println!("{} {}", "declined".dimmed(), path.display());
    }
    for (path, err) in &report.failed {
        println!("{} {}: {}", "failed".red(), path.display(), err);
    }

    if !report.failed.is_empty() {
        bail!("{} of {} paths failed", report.failed.len(), paths.len());
    }
    Ok(())
}

struct PromptConfirmation;

impl Confirmation for PromptConfirmation {
    fn confirm(&self, action: SyncAction, path: &Path) -> bool {
        let prompt = format!("{} {}?", capitalize(&action.to_string()), path.display());
        prompt_confirm(&prompt, Some(false)).unwrap_or(false)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
