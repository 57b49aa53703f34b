//! Ingestion pipeline.
//!
//! Turns page snapshots into stored playlists:
//! scrape, carry over the custom name, re-apply saved progress, recompute
//! statistics and save. Also records watched videos as they are detected.

use chrono::{DateTime, Utc};
use scraper::Html;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::calculate::compute_statistics;
use crate::extract::{current_video_id, ExtractError, PlaylistExtractor};
use crate::models::{PageKind, Playlist, PlaylistId, PlaylistMetadata, VideoId};
use crate::storage::{PlannerStore, StorageError};

/// Errors that can occur while ingesting a page.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Not a playlist page: {0}")]
    NotAPlaylistPage(String),

    #[error("Playlist panel not found on watch page: {0}")]
    PanelNotFound(String),

    #[error("No video ID in URL: {0}")]
    MissingVideoId(String),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Result of ingesting a page.
#[derive(Debug, Clone)]
pub enum Ingested {
    /// A dedicated playlist page, parsed and saved
    Full(Playlist),

    /// A watch page; only the playlist header is known and nothing is saved
    Lite(PlaylistMetadata),
}

/// Ingest a rendered YouTube page.
pub fn ingest_page(
    store: &PlannerStore,
    extractor: &PlaylistExtractor,
    page_url: &Url,
    html: &str,
    now: DateTime<Utc>,
) -> Result<Ingested, IngestError> {
    match PageKind::from_url(page_url.as_str()) {
        PageKind::Playlist => {}
        PageKind::WatchPlaylist => {
            let document = Html::parse_document(html);
            return extractor
                .extract_watch_metadata(&document, page_url, now)?
                .map(Ingested::Lite)
                .ok_or_else(|| IngestError::PanelNotFound(page_url.to_string()));
        }
        PageKind::Other => return Err(IngestError::NotAPlaylistPage(page_url.to_string())),
    }

    let mut playlist = extractor.parse_playlist(html, page_url, now)?;

    if let Some(existing) = store.get_playlist(playlist.id())? {
        // A page that rendered no items must not replace a cached playlist
        if playlist.videos.is_empty() && !existing.videos.is_empty() {
            warn!(
                "No videos found on {}; keeping the cached copy of {}",
                page_url,
                existing.id()
            );
            return Ok(Ingested::Full(existing));
        }
        playlist.custom_name = existing.custom_name;
    }

    if let Some(progress) = store.get_progress(playlist.id())? {
        let restored = playlist.apply_watched(&progress.watched_videos);
        if restored > 0 {
            debug!("Restored {} watched videos from saved progress", restored);
            playlist.statistics = compute_statistics(&playlist.videos);
        }
    }

    let playlist = store.save_playlist(&playlist)?;
    store.record_sync(now)?;

    info!(
        "Ingested {}: {}/{} watched ({}%)",
        playlist.display_name(),
        playlist.statistics.watched_count,
        playlist.statistics.available_videos,
        playlist.statistics.percent_complete
    );

    Ok(Ingested::Full(playlist))
}

/// Record a watched video and refresh the cached playlist.
///
/// Returns the cached playlist (updated when the video was part of it), or
/// `None` when the playlist has not been ingested yet.
pub fn record_watched(
    store: &PlannerStore,
    playlist_id: &PlaylistId,
    video_id: &VideoId,
) -> Result<Option<Playlist>, IngestError> {
    store.mark_video_watched(playlist_id, video_id)?;

    let Some(mut playlist) = store.get_playlist(playlist_id)? else {
        return Ok(None);
    };

    if playlist.apply_watched(std::slice::from_ref(video_id)) == 0 {
        return Ok(Some(playlist));
    }

    playlist.statistics = compute_statistics(&playlist.videos);
    Ok(Some(store.save_playlist(&playlist)?))
}

/// Check a watch page snapshot for the current video's watched badge and
/// record it if present. Returns the recorded video ID.
pub fn detect_watched(
    store: &PlannerStore,
    extractor: &PlaylistExtractor,
    page_url: &Url,
    html: &str,
) -> Result<Option<VideoId>, IngestError> {
    let playlist_id = crate::extract::playlist_id_from_url(page_url)
        .ok_or_else(|| IngestError::NotAPlaylistPage(page_url.to_string()))?;
    let video_id = current_video_id(page_url)
        .ok_or_else(|| IngestError::MissingVideoId(page_url.to_string()))?;

    let document = Html::parse_document(html);
    if !extractor.is_marked_watched(&document, &video_id) {
        debug!("Video {} not marked as watched yet", video_id);
        return Ok(None);
    }

    record_watched(store, &playlist_id, &video_id)?;
    Ok(Some(video_id))
}
