//! Layered configuration composer.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      COMPOSER                         │
//!                 │                                                       │
//!   experiment    │  ┌──────────┐    ┌───────────┐    ┌──────────────┐   │
//!   name +        │  │ fragment │───▶│ defaults  │───▶│   overlay    │   │
//!   overrides ────┼─▶│  source  │    │ expansion │    │    merger    │   │
//!                 │  └──────────┘    └───────────┘    └──────┬───────┘   │
//!                 │       ▲                                   │           │
//!                 │       │                                   ▼           │
//!                 │  ┌──────────┐    ┌───────────┐    ┌──────────────┐   │
//!   resolved  ◀───┼──│ render   │◀───│ resolved  │◀───│  reference   │   │
//!   YAML/JSON     │  │          │    │  config   │    │   resolver   │   │
//!                 │  └──────────┘    └───────────┘    └──────────────┘   │
//!                 │                                                       │
//!                 │  ┌─────────────────────────────────────────────────┐ │
//!                 │  │ settings (composer.toml) · logging · watcher    │ │
//!                 │  └─────────────────────────────────────────────────┘ │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use config_composer::compose::{parse_overrides, Composer, Override, ResolvedConfig};
use config_composer::config::{apply_cli_flags, load_settings, ComposerSettings, ConfigWatcher, OutputFormat};
use config_composer::observability::init_logging;

const DEFAULT_SETTINGS: &str = "composer.toml";

#[derive(Parser)]
#[command(name = "composer")]
#[command(about = "Compose layered YAML experiment configurations", long_about = None)]
struct Cli {
    /// Settings file (TOML). `composer.toml` is used when present.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Search path directory, searched before the configured ones. Repeatable.
    #[arg(short = 'p', long = "search-path")]
    search_path: Vec<PathBuf>,

    /// Log level, overriding the settings file.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Root fragment, e.g. `experiment/lra/s4-listops`
    name: String,

    /// `key.path=value` or `group=option` overrides
    overrides: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a configuration and print the resolved tree
    Compose {
        #[command(flatten)]
        target: Target,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Compose a configuration and list the fragments it pulled in
    Check {
        #[command(flatten)]
        target: Target,
    },
    /// Recompose and print whenever a fragment on the search path changes
    Watch {
        #[command(flatten)]
        target: Target,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = apply_cli_flags(
        read_settings(cli.settings.as_deref())?,
        &cli.search_path,
        cli.log_level.as_deref(),
    )?;

    init_logging(&settings.logging.level);
    tracing::debug!(search_path = ?settings.search_path, "Settings loaded");

    let composer = Composer::with_search_path(settings.search_path.clone());

    match cli.command {
        Commands::Compose { target, format } => {
            let overrides = parse_overrides(&target.overrides)?;
            let config = composer.compose(&target.name, &overrides)?;
            print_config(&config, format.unwrap_or(settings.output.format))?;
        }
        Commands::Check { target } => {
            let overrides = parse_overrides(&target.overrides)?;
            let config = composer.compose(&target.name, &overrides)?;
            println!("{}: ok", target.name);
            for fragment in config.fragments() {
                println!("  {}", fragment);
            }
        }
        Commands::Watch { target, format } => {
            let overrides = parse_overrides(&target.overrides)?;
            let format = format.unwrap_or(settings.output.format);
            watch(composer, &settings, target.name, overrides, format).await?;
        }
    }

    Ok(())
}

fn read_settings(path: Option<&Path>) -> Result<ComposerSettings, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(load_settings(path)?),
        None if Path::new(DEFAULT_SETTINGS).is_file() => Ok(load_settings(Path::new(DEFAULT_SETTINGS))?),
        None => Ok(ComposerSettings::default()),
    }
}

async fn watch(
    composer: Composer,
    settings: &ComposerSettings,
    name: String,
    overrides: Vec<Override>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match composer.compose(&name, &overrides) {
        Ok(config) => print_config(&config, format)?,
        Err(e) => tracing::error!("Initial composition of {} failed: {}", name, e),
    }

    let (watcher, mut updates) = ConfigWatcher::new(
        composer,
        name,
        overrides,
        settings.search_path.clone(),
        Duration::from_millis(settings.watch.poll_interval_ms),
    );
    let _watcher = watcher.run()?;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => print_config(&config, format)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watcher");
                break;
            }
        }
    }
    Ok(())
}

fn print_config(config: &ResolvedConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Yaml => print!("{}", config.to_yaml()?),
        OutputFormat::Json => println!("{}", config.to_json_pretty()?),
    }
    Ok(())
}
