//! `reel` CLI - search a catalog and resolve playable links

mod cmd;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use reel::{LinkResolver, ReelConfig};

#[derive(Parser)]
#[command(name = "reel")]
#[command(about = "Find playable streams for films and TV episodes")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/reel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider to query
    #[arg(short, long, global = true, default_value = "flixhq")]
    provider: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the provider's catalog
    Search {
        /// Title to search for
        query: String,

        /// Result page (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show metadata for a title
    Info {
        /// Film id from search results (e.g., tv/watch-dark-17890)
        film_id: String,

        /// Treat the title as a TV show (inferred from `tv/` ids)
        #[arg(long)]
        tv: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve streams and subtitles for a film or episode
    Sources {
        /// Film id from search results
        film_id: String,

        /// Season number (TV shows)
        #[arg(short, long, requires = "episode")]
        season: Option<u32>,

        /// Episode number within the season
        #[arg(short, long, requires = "season")]
        episode: Option<u32>,

        /// Print one JSON object per line instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn init_logging(config: &ReelConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReelConfig::load_from(path)?,
        None => ReelConfig::load()?,
    };
    init_logging(&config);

    let resolver = LinkResolver::from_config(&config)?;

    match cli.command {
        Commands::Search {
            query,
            page,
            format,
        } => {
            cmd::search::cmd_search(&resolver, &cli.provider, &query, page, format).await?;
        }
        Commands::Info {
            film_id,
            tv,
            format,
        } => {
            cmd::info::cmd_info(&resolver, &cli.provider, &film_id, tv, format).await?;
        }
        Commands::Sources {
            film_id,
            season,
            episode,
            json,
        } => {
            let found = cmd::sources::cmd_sources(
                &resolver,
                &cli.provider,
                &film_id,
                season.zip(episode),
                json,
            )
            .await?;
            if !found {
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
