//! midi-locator - resolve MIDI locators and list connected hardware

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midi_locator::backend::open_table;
use midi_locator::config::{AppConfig, Backend};
use midi_locator::paths::AppPaths;
use midi_locator::{DeviceTable, Direction};

mod cli;

use crate::cli::OutputFormat;

/// Resolve "device::entity" MIDI locators and list connected MIDI hardware
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Device table backend (overrides the config file)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// YAML topology file to use instead of the platform table
    #[arg(short, long)]
    topology: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every device with its entities and online status
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Resolve a "device::entity" locator (or alias) to an endpoint
    Resolve {
        locator: String,

        #[arg(short, long, value_enum, default_value_t = Direction::Source)]
        direction: Direction,

        #[arg(short, long, default_value_t = 0)]
        index: usize,
    },

    /// Show the first device with the given name
    Device { name: String },

    /// Resolve a source by device name and entity position
    Source {
        device: String,

        entity_index: usize,

        #[arg(short, long, default_value_t = 0)]
        index: usize,
    },
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.log_json)?;

    let config_path = args.config.clone().unwrap_or_else(|| AppPaths::detect().config);
    debug!("Configuration file: {}", config_path.display());

    let mut config = AppConfig::load_or_default(&config_path)?;
    if let Some(topology) = args.topology {
        config.topology = Some(topology);
        config.backend = Backend::File;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    config.validate()?;

    let table = open_table(&config)?;
    info!("Device table opened ({} devices)", table.device_count());

    let found = match args.command {
        Command::List { format } => cli::list(&*table, format)?,
        Command::Resolve {
            locator,
            direction,
            index,
        } => cli::resolve(&*table, &config.expand_alias(&locator), direction, index),
        Command::Device { name } => cli::device(&*table, &name),
        Command::Source {
            device,
            entity_index,
            index,
        } => cli::source(&*table, &device, entity_index, index),
    };

    if !found {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
