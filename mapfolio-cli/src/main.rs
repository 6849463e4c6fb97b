//! Mapfolio CLI - browse geo-located listings from the terminal.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use mapfolio::config::ConfigFile;
use mapfolio::logging::init_logging;

use commands::browse::BrowseArgs;
use commands::common::{EntityTypeArg, PurposeArg};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "mapfolio")]
#[command(version, about = "Browse property and project listings on a map", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/mapfolio/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `mapfolio=trace` (RUST_LOG wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load listings for a city and print the list and map windows
    Browse {
        /// City to load (default: discovery.default_city)
        #[arg(long)]
        city: Option<String>,

        /// Treat "lat,lon" as the device location and load around it
        #[arg(long, conflicts_with = "city", allow_hyphen_values = true)]
        near: Option<String>,

        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,

        /// Which entities to show
        #[arg(long, value_enum)]
        entity_type: Option<EntityTypeArg>,

        /// Which property purposes to show
        #[arg(long, value_enum)]
        purpose: Option<PurposeArg>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Print place predictions for a partial query
    Suggest {
        /// Partial place name
        query: String,

        /// Resolve the Nth prediction to coordinates
        #[arg(long)]
        resolve: Option<usize>,
    },

    /// Show or initialise configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let mut logging = config.logging();
    if let Some(level) = cli.log_level {
        logging = logging.with_level(level);
    }
    let _guard = init_logging(&logging)?;

    match cli.command {
        Commands::Browse {
            city,
            near,
            search,
            entity_type,
            purpose,
            pages,
        } => commands::browse::run(
            &config,
            BrowseArgs {
                city,
                near,
                search,
                entity_type,
                purpose,
                pages,
            },
        ),
        Commands::Suggest { query, resolve } => commands::suggest::run(&config, &query, resolve),
        Commands::Config(command) => {
            commands::config::run(command, &config, cli.config.as_deref())
        }
    }
}
