// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CLI entry point for another-keyboard-layer
//!
//! Runs the virtual layer with live reload, validates config files and
//! offers an interactive key combination parser.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::{
    collections::hash_map::DefaultHasher,
    fs,
    hash::{Hash, Hasher},
    io::{self, BufRead},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use another_keyboard_layer::{
    config::{default_config_path, Configuration, ConfigurationProvider},
    core::KeyCombination,
    engine::{DryRunEngine, LifecycleBridge},
    instance::{self, ClaimOutcome},
    reload::{FileSource, FileWatcher, LiveReloader, ReloadError, ReloadOutcome},
};

/// Name claimed by the single-instance guard
const INSTANCE_IDENTIFIER: &str = "another-keyboard-layer";

#[derive(Parser)]
#[command(name = "akl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct ConfigArgs {
    /// Path to an existing config file (default location if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the virtual layer (default)
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Don't reload the config file when it changes
        #[arg(long)]
        no_watch: bool,
    },

    /// Validate a config file and print its contents
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Interactive key combination parser
    Parse,

    /// Print the default config file location
    DefaultPath,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run {
        config: ConfigArgs::default(),
        no_watch: false,
    }) {
        Commands::Run { config, no_watch } => run_layer(config.config.as_deref(), !no_watch)?,
        Commands::Check { config } => check_config(config.config.as_deref())?,
        Commands::Parse => parse_interactive()?,
        Commands::DefaultPath => println!("{}", default_config_path()?.display()),
    }

    Ok(())
}

/// Resolve `--config` (tilde expanded, must exist) or the default location
fn resolve_config_path(config: Option<&Path>) -> anyhow::Result<PathBuf> {
    let Some(config) = config else {
        return Ok(default_config_path()?);
    };

    let expanded = shellexpand::tilde(
        config
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    let path = PathBuf::from(expanded.as_ref());

    if !path.is_file() {
        bail!(
            "The config option only accepts existing files: {}",
            path.display()
        );
    }

    Ok(path)
}

/// Claim the instance, start the engine and keep it in sync with the file
fn run_layer(config: Option<&Path>, watch: bool) -> anyhow::Result<()> {
    if instance::claim(INSTANCE_IDENTIFIER, true)? == ClaimOutcome::AlreadyClaimed {
        bail!("Another instance is already running");
    }

    let path = resolve_config_path(config)?;
    println!("{} Loading config: {}", "→".cyan(), path.display());

    let provider = ConfigurationProvider::load_from_path(path)
        .context("Couldn't load config file")?;
    let configuration = provider.configuration().clone();

    // Must be in place before the engine starts
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("Failed to install Ctrl-C handler")?;

    let mut bridge = LifecycleBridge::new(DryRunEngine::new(), configuration)?;
    bridge.update()?;
    println!(
        "{} Virtual layer running ({} mappings, switch key {})",
        "✓".green(),
        bridge.configuration().mappings.len(),
        bridge.configuration().switch_key.to_string().cyan()
    );
    println!("Quit with Ctrl + C");

    if watch {
        let watcher = FileWatcher::new(provider.path())?;
        let mut reloader = LiveReloader::new(bridge, FileSource::new(provider.path()));
        reloader.run(&watcher, &shutdown, print_reload_outcome)?;
        bridge = reloader.into_bridge();
    } else {
        while !shutdown.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(200));
        }
    }

    bridge.destroy();
    println!("Bye");
    Ok(())
}

fn print_reload_outcome(outcome: &Result<ReloadOutcome, ReloadError>) {
    match outcome {
        Ok(ReloadOutcome::Applied) => println!("{}", "Reload successful.".green()),
        Ok(ReloadOutcome::Duplicate) => {}
        Err(e) => println!("{} {}", "Failed:".red().bold(), e),
    }
}

/// Validate a config file without starting anything
fn check_config(config: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_config_path(config)?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    println!("{} Checking config: {}", "→".cyan(), path.display());

    let configuration = match Configuration::from_document(&content) {
        Ok(configuration) => configuration,
        Err(e) => {
            println!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!("{} {}\n", "✓".green().bold(), "Config is valid".bold());
    println!("  start with system:  {}", configuration.autostart);
    println!("  switch key:         {}", configuration.switch_key.to_string().cyan());
    println!(
        "  default combination: {}",
        configuration
            .default_combination
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "(none)".dimmed().to_string())
    );

    let mappings = configuration.sorted_mappings();
    println!("\n{}", format!("Mappings ({})", mappings.len()).bold());
    for (source, replacement) in mappings {
        println!("  {} → {}", source.to_string().cyan(), replacement.to_string().green());
    }

    Ok(())
}

/// Parse key combinations typed on stdin until EOF
fn parse_interactive() -> anyhow::Result<()> {
    println!("Simple interactive key combination parser! [Ctrl + D to quit]");

    for line in io::stdin().lock().lines() {
        let line = line?;
        match KeyCombination::parse(&line) {
            Ok(combination) => {
                let mut hasher = DefaultHasher::new();
                combination.hash(&mut hasher);
                println!(
                    "You typed the key combination: {} ({:016x})",
                    combination.to_string().cyan(),
                    hasher.finish()
                );
            }
            Err(e) => println!(
                "{} {}",
                "Unfortunately that input wasn't a valid key combination:".red(),
                e
            ),
        }
    }

    println!("Bye");
    Ok(())
}
