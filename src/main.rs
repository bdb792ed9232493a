mod cli;
mod error;

use crate::cli::{Args, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use figment::providers::Serialized;
use lumen_cache::{Database, Repository};
use lumen_config::Config;
use lumen_library::{Indexer, MediaNode, SearchMatch, SearchType, Subtitle, SubtitleSource};
use lumen_media::{Ffmpeg, ThumbnailPipeline};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// `EX_TEMPFAIL` from sysexits.h: worth trying again later.
const EXIT_TEMPFAIL: u8 = 75;

#[derive(Serialize)]
struct SearchResults {
    query: String,
    search_type: SearchType,
    count: usize,
    results: Vec<SearchMatch>,
}

#[derive(Serialize)]
struct Videos {
    videos: Vec<MediaNode>,
}

#[derive(Serialize)]
struct Subtitles {
    subtitles: Vec<Subtitle>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = match cli::verbosity(args.verbose) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            match err.is_retryable() {
                true => ExitCode::from(EXIT_TEMPFAIL),
                false => ExitCode::FAILURE,
            }
        },
    }
}

async fn run(args: Args) -> Result<()> {
    let mut figment = Config::figment(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(media_root) = &args.media_root {
        figment = figment.merge(Serialized::default("media_root", media_root));
    }
    let config = Config::from_figment(figment).or_raise(|| ErrorKind::Config)?;

    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
    }
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    let repo = Repository::from(&db);
    match repo.count().await {
        Ok(entries) => tracing::debug!(entries, database = %config.database.display(), "Metadata cache ready"),
        Err(err) => tracing::warn!(error = ?err, "Could not count cache entries"),
    }

    let tools = Ffmpeg::with_executables(&config.tools.ffprobe, &config.tools.ffmpeg);
    let pipeline = ThumbnailPipeline::new(Arc::new(tools))
        .with_timeouts(config.tools.timeouts())
        .with_url_prefix(&config.thumbnails.url_prefix);
    let indexer = Indexer::new(&config.media_root, &config.thumbnails.dir, repo, pipeline)
        .or_raise(|| ErrorKind::Library)?
        .with_subtitles(SubtitleSource::new(config.subtitles.dir.clone(), &config.subtitles.url_prefix));

    let result = execute(&indexer, args.command).await;
    db.close().await;
    result
}

async fn execute(indexer: &Indexer, command: Command) -> Result<()> {
    match command {
        Command::Browse { path, sort, order } => {
            let listing = indexer.browse(&path, sort, order).await.or_raise(|| ErrorKind::Request)?;
            print(&listing)
        },
        Command::Search { query, search_type, within } => {
            let results = match within {
                Some(base) => indexer.search_in(&base, &query, search_type).await.or_raise(|| ErrorKind::Request)?,
                None => indexer.search(&query, search_type).await,
            };
            print(&SearchResults {
                query: query.trim().to_string(),
                search_type,
                count: results.len(),
                results,
            })
        },
        Command::Metadata { path } => {
            let entry = indexer.metadata(&path).await.or_raise(|| ErrorKind::Request)?;
            print(&entry)
        },
        Command::Videos => print(&Videos { videos: indexer.videos().await }),
        Command::Subtitles { path } => {
            let subtitles = indexer.subtitles(&path).await.or_raise(|| ErrorKind::Request)?;
            print(&Subtitles { subtitles })
        },
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Output)?;
    println!("{json}");
    Ok(())
}
