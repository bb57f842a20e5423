mod cache;
mod config;
mod error;
mod genius;
mod lyrics;
mod normalize;
mod resolver;
mod retry;
mod service;

use anyhow::Context;
use clap::{Parser, Subcommand};
use error::{ErrorBody, LookupError};
use serde::Serialize;
use service::{LookupOutcome, LyricsService};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "verse",
    version,
    about = "Resolve song titles to lyrics pages and scrape the lyrics"
)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// API access token (overrides the config file).
    #[arg(long, env = "GENIUS_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Debug logging on stderr. `RUST_LOG` takes precedence.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the normalized (artist, song) pair for a title.
    Normalize {
        query: String,
        /// Uploading channel name, used when the title has no delimiter.
        #[arg(long)]
        channel: Option<String>,
    },
    /// Resolve a title to its canonical lyrics URL.
    Resolve {
        query: String,
        #[arg(long)]
        channel: Option<String>,
    },
    /// Resolve a title and scrape its lyrics.
    Lyrics {
        query: String,
        #[arg(long)]
        channel: Option<String>,
    },
    /// Scrape lyrics from a known song page URL.
    Page { url: String },
    /// Extract lyrics from a saved HTML page (`-` reads stdin).
    Extract { path: PathBuf },
    /// Store an API access token in the config file (omit to clear it).
    SetToken { token: Option<String> },
    /// Print the config file path.
    ConfigPath,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "verse=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    match cli.command {
        Command::ConfigPath => {
            let path = match cli.config {
                Some(p) => p,
                None => config::default_config_path().context("default config path")?,
            };
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::SetToken { token } => {
            let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
            let cleared = token.is_none();
            cfg.genius.access_token = token;
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            if cleared {
                println!("Cleared access token.");
            } else {
                println!("Updated access token in config.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Normalize { query, channel } => {
            let q = normalize::normalize_with_channel(&query, channel.as_deref());
            print_json(&q)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract { path } => {
            let html = read_input(&path).await?;
            let result = lyrics::extract(&html)
                .map(|lyrics| LookupOutcome::Lyrics { lyrics })
                .ok_or_else(|| LookupError::Extraction("Lyrics not found on page".to_string()));
            report(result)
        }
        Command::Resolve { query, channel } => {
            let svc = build_service(cli.config.as_deref(), cli.token)?;
            report(svc.resolve_url(&query, channel.as_deref()).await)
        }
        Command::Lyrics { query, channel } => {
            let svc = build_service(cli.config.as_deref(), cli.token)?;
            report(svc.lookup_lyrics(&query, channel.as_deref()).await)
        }
        Command::Page { url } => {
            let svc = build_service(cli.config.as_deref(), cli.token)?;
            report(svc.lyrics_from_page(&url).await)
        }
    }
}

fn build_service(
    config_path: Option<&std::path::Path>,
    token: Option<String>,
) -> anyhow::Result<LyricsService> {
    let cfg = config::load(config_path).context("load config")?;

    let token = token.or_else(|| cfg.genius.access_token.clone());
    if token.is_none() {
        tracing::warn!("no API access token configured; searches will likely be rejected");
    }
    let proxy_key = cfg
        .scrape
        .proxy_key
        .clone()
        .or_else(|| std::env::var("SCRAPER_API_KEY").ok());

    let cache = cache::open(&cfg.cache).context("open cache")?;
    let api = genius::GeniusClient::new(&cfg.genius, &cfg.http, token.as_deref())?;
    let resolver = resolver::Resolver::new(
        Arc::new(api),
        cache.clone(),
        resolver::ResolverOptions {
            catalog_page_size: cfg.genius.catalog_page_size,
            catalog_max_pages: cfg.genius.catalog_max_pages,
            seed_artists: cfg.artists.clone(),
        },
    );
    let pages = lyrics::PageFetcher::new(
        &cfg.http,
        &cfg.scrape,
        proxy_key,
        retry::RetryPolicy::from_config(&cfg.scrape),
    )?;

    Ok(LyricsService::new(
        resolver,
        Arc::new(pages),
        cache,
        cfg.http.deadline(),
    ))
}

async fn read_input(path: &std::path::Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("read stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the outcome as JSON; errors map to a non-zero exit status.
fn report(result: Result<LookupOutcome, LookupError>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(outcome) => {
            print_json(&outcome)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!(kind = e.kind().as_str(), error = %e, "lookup failed");
            print_json(&ErrorBody::from(&e))?;
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}
