use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use sekaidl_etl::Config;

mod commands;
mod logging;

#[derive(Debug, Parser)]
#[command(name = "sekaidl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output root (deleted and recreated on every run)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Keep songs added more than this many days ago
    #[arg(long, global = true)]
    cutoff_days: Option<u32>,

    /// Log level: trace, debug, info, warn, or error
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Download, convert, and tag every eligible song (the default)
    ///
    /// Reads the song index, keeps songs whose "date added" is older than the
    /// cutoff, and for each one:
    ///
    /// - Extracts the title, cover art, and the list of sung versions
    /// - Saves the cover as <output>/<title>/cover.jpg
    /// - Downloads each version to <output>/<title>/<title>_<n>.mp3
    /// - Converts non-MP3 downloads with ffmpeg
    /// - Writes title, artist, album, and cover art as ID3 tags
    ///
    /// The output directory is wiped at the start of every run. A failed song
    /// or version is reported and skipped; only a failure to read the index
    /// stops the run.
    Run,
    /// List eligible songs and their versions without downloading anything
    List {
        /// Only extract the first N songs
        #[arg(long, short)]
        limit: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(cutoff_days) = cli.cutoff_days {
        config.cutoff_days = cutoff_days;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    logging::init(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            commands::run_pipeline(&config).await?;
        }
        Commands::List { limit, json } => {
            commands::list_songs(&config, limit, json).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
