//! wikiredirects: resolve Wikipedia redirects and extract redirect-aware artifacts

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use wikiredirects::config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "wikiredirects")]
#[command(about = "Resolve redirect chains in Wikimedia dumps")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Resolve all redirects of a dump into forward and reverse maps
    Resolve {
        /// Path to the dump (.xml or .xml.bz2)
        dump: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum redirect hops followed per chain
        #[arg(long)]
        max_depth: Option<usize>,

        /// Number of edge partitions
        #[arg(long)]
        partitions: Option<usize>,

        /// Worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Resolve redirects, then extract article text, paragraph links and surface forms
    Extract {
        /// Path to the dump (.xml or .xml.bz2)
        dump: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum plain text length for an article to be emitted
        #[arg(long)]
        min_length: Option<usize>,

        /// Stop after this many records
        #[arg(long)]
        max_records: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or create config
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    config.logging.init(cli.verbose)?;
    debug!("Using configuration: {:?}", config);

    match cli.command {
        Commands::Init { path } => commands::init_config(path),
        Commands::Resolve {
            dump,
            output,
            max_depth,
            partitions,
            threads,
        } => {
            if let Some(dir) = output {
                config.output.dir = dir;
            }
            if let Some(max_depth) = max_depth {
                config.resolve.max_depth = max_depth;
            }
            if partitions.is_some() {
                config.resolve.partitions = partitions;
            }
            if threads.is_some() {
                config.resolve.threads = threads;
            }
            config.validate()?;

            commands::resolve_dump(config, dump, cli.quiet)
        }
        Commands::Extract {
            dump,
            output,
            min_length,
            max_records,
        } => {
            if let Some(dir) = output {
                config.output.dir = dir;
            }
            if let Some(min_length) = min_length {
                config.import.min_text_length = min_length;
            }
            if max_records.is_some() {
                config.import.max_records = max_records;
            }
            config.validate()?;

            commands::extract_artifacts(config, dump, cli.quiet)
        }
    }
}
