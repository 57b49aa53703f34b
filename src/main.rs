use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use playlist_planner::config::AppConfig;
use playlist_planner::extract::PlaylistExtractor;
use playlist_planner::fetch::{FileSource, Fetcher, PageSource};
use playlist_planner::format::{format_date, format_duration, time_remaining_text};
use playlist_planner::ingest::{self, Ingested};
use playlist_planner::storage::{PlannerStore, StorageConfig};
use playlist_planner::{
    compute_plan, parse_duration, Playlist, PlaylistId, SettingsUpdate, Theme, VideoId,
    DAILY_MINUTES_PRESETS, PLAYBACK_SPEEDS,
};

#[derive(Parser)]
#[command(name = "playlist-planner")]
#[command(about = "Plan how long a YouTube playlist will take to watch")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a duration label such as "1:02:03"
    Duration { text: String },

    /// Scrape a playlist page snapshot and save it
    Ingest {
        /// Page URL the snapshot was taken from
        #[arg(long)]
        url: String,

        /// Saved page markup; fetched from the URL when omitted
        #[arg(long)]
        file: Option<PathBuf>,

        /// Skip the fetch cache
        #[arg(long)]
        fresh: bool,
    },

    /// Show the watch plan for a tracked playlist
    Plan {
        playlist_id: String,

        /// Playback speed (defaults to the saved setting)
        #[arg(long)]
        speed: Option<f64>,

        /// Minutes watched per day (defaults to the saved setting)
        #[arg(long)]
        daily_minutes: Option<f64>,
    },

    /// List tracked playlists
    List,

    /// Mark a video as watched
    Watched {
        playlist_id: String,
        video_id: String,
    },

    /// Record the current video of a watch page if it shows as watched
    DetectWatched {
        /// Watch page URL (with v= and list=)
        #[arg(long)]
        url: String,

        /// Saved page markup
        #[arg(long)]
        file: PathBuf,
    },

    /// Set a custom display name for a playlist
    Rename { playlist_id: String, name: String },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Stop tracking a playlist and forget its progress
    Remove { playlist_id: String },

    /// Drop cached playlists, keeping progress and settings
    ClearCache,

    /// Drop all stored data
    Clear,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,

    Set {
        #[arg(long)]
        speed: Option<f64>,

        #[arg(long)]
        daily_minutes: Option<f64>,

        /// "light" or "dark"
        #[arg(long)]
        theme: Option<Theme>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let log_level = cli.log_level.unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting playlist-planner v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let store = PlannerStore::open(&storage).with_default_settings(config.defaults.settings());

    match cli.command {
        Commands::Duration { text } => {
            let seconds = parse_duration(&text);
            println!(
                "{} seconds ({})",
                seconds,
                format_duration(seconds, false)
            );
        }
        Commands::Ingest { url, file, fresh } => {
            let page_url = Url::parse(&url).with_context(|| format!("Invalid URL: {}", url))?;

            let source: Box<dyn PageSource> = match file {
                Some(path) => Box::new(FileSource::new(path)),
                None => Box::new(
                    Fetcher::new(config.fetch.fetcher_config(storage.raw_dir(), fresh))
                        .context("Failed to create fetcher")?,
                ),
            };
            let html = source.load(&page_url).await?;

            let extractor = PlaylistExtractor::new(&config.extract)?;
            match ingest::ingest_page(&store, &extractor, &page_url, &html, Utc::now())? {
                Ingested::Full(playlist) => print_playlist(&playlist),
                Ingested::Lite(metadata) => {
                    println!("\n=== {} (watch page) ===", metadata.title);
                    println!("Playlist ID:      {}", metadata.id);
                    println!("URL:              {}", metadata.url);
                    println!("\nOpen the playlist page and ingest it for full statistics.");
                }
            }
        }
        Commands::Plan {
            playlist_id,
            speed,
            daily_minutes,
        } => {
            let id = PlaylistId::new(playlist_id);
            let playlist = store
                .get_playlist(&id)?
                .with_context(|| format!("Playlist {} is not tracked; ingest it first", id))?;

            let settings = store.settings()?.merge(&SettingsUpdate {
                playback_speed: speed,
                daily_minutes,
                theme: None,
            });
            let today = Local::now().date_naive();
            let stats = &playlist.statistics;
            let plan = compute_plan(
                stats,
                settings.playback_speed,
                settings.daily_minutes,
                today,
            );

            println!("\n=== Plan: {} ===", playlist.display_name());
            if stats.is_complete() {
                println!("Complete! All {} videos watched.", stats.available_videos);
                return Ok(());
            }
            println!(
                "Remaining:        {} videos, {}",
                stats.remaining_videos,
                format_duration(stats.remaining_duration, false)
            );
            println!(
                "{:<18}{}",
                format!("At {}x:", settings.playback_speed),
                format_duration(plan.adjusted_remaining_seconds, false)
            );
            println!("Daily budget:     {} min", settings.daily_minutes);
            println!("Days to finish:   {}", plan.days_to_finish);
            let finish_by = match plan.completion_date {
                Some(date) => format_date(date, today),
                None if plan.days_to_finish.is_unbounded() => {
                    "Never (set a daily budget)".to_string()
                }
                None => "Beyond the calendar".to_string(),
            };
            println!("Finish by:        {}", finish_by);
            println!("Videos per day:   {}", plan.videos_per_day);
        }
        Commands::List => {
            let entries = store.dashboard()?;
            if entries.is_empty() {
                println!("No playlists tracked yet.");
                println!("Use `ingest` with a playlist page to start tracking one.");
                return Ok(());
            }

            println!("\n=== Tracked Playlists ({}) ===\n", entries.len());
            for entry in &entries {
                println!("  {}  [{}]", entry.name, entry.id);
                println!(
                    "    {}/{} watched ({}%), {}",
                    entry.statistics.watched_count,
                    entry.statistics.available_videos,
                    entry.statistics.percent_complete,
                    time_remaining_text(entry.statistics.remaining_duration)
                );
                if let Some(updated) = entry.last_updated {
                    println!("    Updated: {}", updated.format("%Y-%m-%d %H:%M UTC"));
                }
            }
            if let Some(synced) = store.last_sync()? {
                println!("\nLast sync: {}", synced.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        Commands::Watched {
            playlist_id,
            video_id,
        } => {
            let id = PlaylistId::new(playlist_id);
            let video = VideoId::new(video_id);
            match ingest::record_watched(&store, &id, &video)? {
                Some(playlist) => print_playlist(&playlist),
                None => println!(
                    "Recorded {} as watched; playlist {} is not tracked yet.",
                    video, id
                ),
            }
        }
        Commands::DetectWatched { url, file } => {
            let page_url = Url::parse(&url).with_context(|| format!("Invalid URL: {}", url))?;
            let html = FileSource::new(file).load(&page_url).await?;

            let extractor = PlaylistExtractor::new(&config.extract)?;
            match ingest::detect_watched(&store, &extractor, &page_url, &html)? {
                Some(video) => println!("Marked {} as watched.", video),
                None => println!("Current video is not marked as watched yet."),
            }
        }
        Commands::Rename { playlist_id, name } => {
            let id = PlaylistId::new(playlist_id);
            if !store.set_custom_name(&id, &name)? {
                bail!("Playlist {} is not tracked", id);
            }
            println!("Renamed {}.", id);
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => print_settings(&store)?,
            SettingsAction::Set {
                speed,
                daily_minutes,
                theme,
            } => {
                if speed.is_some_and(|s| !(s > 0.0)) {
                    bail!("--speed must be greater than 0");
                }
                if daily_minutes.is_some_and(|m| !(m > 0.0)) {
                    bail!("--daily-minutes must be greater than 0");
                }
                let settings = store.update_settings(&SettingsUpdate {
                    playback_speed: speed,
                    daily_minutes,
                    theme,
                })?;
                if !settings.is_preset() {
                    tracing::warn!(
                        "Using a custom value; presets are speeds {:?} and daily minutes {:?}",
                        PLAYBACK_SPEEDS,
                        DAILY_MINUTES_PRESETS
                    );
                }
                print_settings(&store)?;
            }
        },
        Commands::Remove { playlist_id } => {
            let id = PlaylistId::new(playlist_id);
            if store.remove_playlist(&id)? {
                println!("Removed {}.", id);
            } else {
                println!("Playlist {} was not tracked.", id);
            }
        }
        Commands::ClearCache => {
            store.clear_cache()?;
            println!("Cleared cached playlists. Progress and settings were kept.");
        }
        Commands::Clear => {
            store.clear()?;
            println!("Cleared all data in {:?}.", storage.store_path());
        }
    }

    Ok(())
}

fn print_playlist(playlist: &Playlist) {
    let stats = &playlist.statistics;

    println!("\n=== {} ===", playlist.display_name());
    println!("Playlist ID:      {}", playlist.id());
    println!(
        "Videos:           {} ({} unavailable)",
        stats.total_videos, stats.unavailable_count
    );
    println!(
        "Watched:          {}/{} ({}%)",
        stats.watched_count, stats.available_videos, stats.percent_complete
    );
    println!(
        "Total duration:   {}",
        format_duration(stats.total_duration, false)
    );
    println!(
        "Remaining:        {} ({})",
        format_duration(stats.remaining_duration, false),
        time_remaining_text(stats.remaining_duration)
    );
}

fn print_settings(store: &PlannerStore) -> Result<()> {
    let settings = store.settings()?;

    println!("\n=== Settings ===");
    println!("Playback speed:   {}x", settings.playback_speed);
    println!("Daily minutes:    {}", settings.daily_minutes);
    println!("Theme:            {}", settings.theme);
    println!("\nPreset speeds:    {}", join_presets(&PLAYBACK_SPEEDS, "x"));
    println!(
        "Preset budgets:   {}",
        join_presets(&DAILY_MINUTES_PRESETS, " min")
    );
    Ok(())
}

fn join_presets(values: &[f64], unit: &str) -> String {
    values
        .iter()
        .map(|v| format!("{}{}", v, unit))
        .collect::<Vec<_>>()
        .join(", ")
}
