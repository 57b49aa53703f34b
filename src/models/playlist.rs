//! Playlist models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PlaylistId, PlaylistStatistics, Video, VideoId};

/// What kind of YouTube page a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Dedicated `/playlist?list=...` page with the full video list
    Playlist,

    /// `/watch?v=...&list=...` page with the playlist side panel
    WatchPlaylist,

    Other,
}

impl PageKind {
    /// Classify a page URL.
    pub fn from_url(url: &str) -> Self {
        if url.contains("/playlist?") {
            PageKind::Playlist
        } else if url.contains("/watch?") && url.contains("list=") {
            PageKind::WatchPlaylist
        } else {
            PageKind::Other
        }
    }
}

/// Header information for a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    pub id: PlaylistId,
    pub title: String,

    /// Video count advertised in the header (0 when not shown)
    pub video_count: u32,

    /// Canonical playlist URL
    pub url: String,

    pub extracted_at: DateTime<Utc>,
}

/// A fully parsed playlist with its derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(flatten)]
    pub metadata: PlaylistMetadata,

    pub videos: Vec<Video>,

    pub statistics: PlaylistStatistics,

    pub parsed_at: DateTime<Utc>,

    /// User-chosen display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,

    /// Set by the store on every save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Playlist {
    pub fn id(&self) -> &PlaylistId {
        &self.metadata.id
    }

    /// Custom name if set, otherwise the scraped title.
    pub fn display_name(&self) -> &str {
        self.custom_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.metadata.title)
    }

    /// Mark every video whose ID is in `watched` as watched.
    ///
    /// Returns how many videos changed state. Statistics are left untouched.
    pub fn apply_watched(&mut self, watched: &[VideoId]) -> usize {
        let mut changed = 0;
        for video in &mut self.videos {
            if !video.is_watched && watched.iter().any(|id| video.has_id(id)) {
                video.is_watched = true;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_playlist() -> Playlist {
        Playlist {
            metadata: PlaylistMetadata {
                id: PlaylistId::from("PL1"),
                title: "Rust Course".to_string(),
                video_count: 2,
                url: "https://www.youtube.com/playlist?list=PL1".to_string(),
                extracted_at: Utc::now(),
            },
            videos: vec![
                Video {
                    id: Some(VideoId::from("a")),
                    title: "Intro".to_string(),
                    duration_seconds: 60,
                    index: 0,
                    is_watched: false,
                    is_unavailable: false,
                },
                Video {
                    id: None,
                    title: "Video 2".to_string(),
                    duration_seconds: 90,
                    index: 1,
                    is_watched: false,
                    is_unavailable: false,
                },
            ],
            statistics: PlaylistStatistics::default(),
            parsed_at: Utc::now(),
            custom_name: None,
            last_updated: None,
        }
    }

    #[test]
    fn test_page_kind_from_url() {
        assert_eq!(
            PageKind::from_url("https://www.youtube.com/playlist?list=PL1"),
            PageKind::Playlist
        );
        assert_eq!(
            PageKind::from_url("https://www.youtube.com/watch?v=abc&list=PL1"),
            PageKind::WatchPlaylist
        );
        assert_eq!(
            PageKind::from_url("https://www.youtube.com/watch?v=abc"),
            PageKind::Other
        );
        assert_eq!(PageKind::from_url("https://www.youtube.com/"), PageKind::Other);
    }

    #[test]
    fn test_display_name_prefers_custom_name() {
        let mut playlist = sample_playlist();
        assert_eq!(playlist.display_name(), "Rust Course");

        playlist.custom_name = Some("Evening study".to_string());
        assert_eq!(playlist.display_name(), "Evening study");

        playlist.custom_name = Some("   ".to_string());
        assert_eq!(playlist.display_name(), "Rust Course");
    }

    #[test]
    fn test_apply_watched_skips_videos_without_id() {
        let mut playlist = sample_playlist();
        let changed = playlist.apply_watched(&[VideoId::from("a"), VideoId::from("zzz")]);

        assert_eq!(changed, 1);
        assert!(playlist.videos[0].is_watched);
        assert!(!playlist.videos[1].is_watched);

        // Second application is a no-op
        assert_eq!(playlist.apply_watched(&[VideoId::from("a")]), 0);
    }

    #[test]
    fn test_playlist_json_flattens_metadata() {
        let playlist = sample_playlist();
        let json = serde_json::to_value(&playlist).unwrap();

        assert_eq!(json["id"], "PL1");
        assert_eq!(json["title"], "Rust Course");
        assert!(json.get("custom_name").is_none());

        let parsed: Playlist = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.metadata.id, playlist.metadata.id);
        assert_eq!(parsed.videos.len(), 2);
    }
}
