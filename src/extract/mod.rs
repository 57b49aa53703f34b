//! Playlist extraction from YouTube DOM snapshots.
//!
//! Works on rendered page markup (e.g. a saved `document.documentElement`):
//! - Playlist header metadata (title, advertised video count)
//! - One `Video` per playlist entry (title, duration, watched, availability)
//! - Playlist title from the side panel of a watch page
//! - Watched-badge detection for the video currently playing

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::calculate::compute_statistics;
use crate::models::{PageKind, Playlist, PlaylistId, PlaylistMetadata, Video, VideoId};
use crate::parse_duration;

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Not a playlist page: {0}")]
    NotAPlaylistPage(String),

    #[error("No playlist ID in URL: {0}")]
    MissingPlaylistId(String),
}

/// CSS selectors used to locate playlist elements.
///
/// Each entry may be a selector list; where the lists are tried in order
/// (`watch_panel_titles`), the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub playlist_title: String,
    pub playlist_stats: String,
    pub video_items: String,
    pub video_link: String,
    pub video_title: String,
    pub video_duration: String,
    pub duration_label: String,
    pub watched_badge: String,
    pub watch_panel_titles: Vec<String>,
    pub panel_items: String,
    pub panel_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            playlist_title:
                "h1.ytd-playlist-header-renderer, yt-formatted-string.ytd-playlist-header-renderer"
                    .to_string(),
            playlist_stats: "#stats .ytd-playlist-header-renderer, #stats".to_string(),
            video_items: "ytd-playlist-video-renderer".to_string(),
            video_link: "a#video-title".to_string(),
            video_title: "#video-title, a#video-title".to_string(),
            video_duration: "ytd-thumbnail-overlay-time-status-renderer".to_string(),
            duration_label: "span[aria-label]".to_string(),
            watched_badge: ".ytd-thumbnail-overlay-resume-playback-renderer, ytd-thumbnail-overlay-resume-playback-renderer".to_string(),
            watch_panel_titles: vec![
                "ytd-playlist-panel-renderer #header-description h3 a".to_string(),
                "ytd-playlist-panel-renderer #title a".to_string(),
                "ytd-playlist-panel-renderer h3.title a".to_string(),
            ],
            panel_items: "ytd-playlist-video-renderer, ytd-playlist-panel-video-renderer"
                .to_string(),
            panel_link: "a#video-title, a#wc-endpoint".to_string(),
        }
    }
}

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Stop after this many playlist entries
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,

    #[serde(default)]
    pub selectors: SelectorConfig,
}

fn default_max_videos() -> usize {
    5000
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_videos: default_max_videos(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// Headings longer than this are not taken as a fallback playlist title.
const MAX_FALLBACK_TITLE_LEN: usize = 200;

/// Compiled selectors and patterns for scraping playlist pages.
pub struct PlaylistExtractor {
    max_videos: usize,
    playlist_title: Selector,
    playlist_stats: Selector,
    any_h1: Selector,
    video_items: Selector,
    video_link: Selector,
    video_title: Selector,
    video_duration: Selector,
    duration_label: Selector,
    watched_badge: Selector,
    watch_panel_titles: Vec<Selector>,
    panel_items: Selector,
    panel_link: Selector,
    video_count_re: Regex,
    video_id_re: Regex,
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Trimmed text content of an element.
fn text_content(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl PlaylistExtractor {
    /// Compile the configured selectors.
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractError> {
        let s = &config.selectors;

        Ok(Self {
            max_videos: config.max_videos,
            playlist_title: compile(&s.playlist_title)?,
            playlist_stats: compile(&s.playlist_stats)?,
            any_h1: compile("h1")?,
            video_items: compile(&s.video_items)?,
            video_link: compile(&s.video_link)?,
            video_title: compile(&s.video_title)?,
            video_duration: compile(&s.video_duration)?,
            duration_label: compile(&s.duration_label)?,
            watched_badge: compile(&s.watched_badge)?,
            watch_panel_titles: s
                .watch_panel_titles
                .iter()
                .map(|sel| compile(sel))
                .collect::<Result<_, _>>()?,
            panel_items: compile(&s.panel_items)?,
            panel_link: compile(&s.panel_link)?,
            video_count_re: Regex::new(r"(?i)(\d[\d,]*)\s*video")?,
            video_id_re: Regex::new(r"[?&]v=([^&#]+)")?,
        })
    }

    /// Create an extractor with the default YouTube selectors.
    pub fn with_defaults() -> Result<Self, ExtractError> {
        Self::new(&ExtractConfig::default())
    }

    /// Parse a dedicated playlist page into a playlist with statistics.
    pub fn parse_playlist(
        &self,
        html: &str,
        page_url: &Url,
        now: DateTime<Utc>,
    ) -> Result<Playlist, ExtractError> {
        let document = Html::parse_document(html);

        let metadata = self.extract_metadata(&document, page_url, now)?;
        let videos = self.extract_videos(&document);
        let statistics = compute_statistics(&videos);

        info!(
            "Parsed playlist {} ({:?}): {} videos, {} watched",
            metadata.id, metadata.title, statistics.total_videos, statistics.watched_count
        );

        Ok(Playlist {
            metadata,
            videos,
            statistics,
            parsed_at: now,
            custom_name: None,
            last_updated: None,
        })
    }

    /// Extract header metadata from a dedicated playlist page.
    pub fn extract_metadata(
        &self,
        document: &Html,
        page_url: &Url,
        now: DateTime<Utc>,
    ) -> Result<PlaylistMetadata, ExtractError> {
        if PageKind::from_url(page_url.as_str()) != PageKind::Playlist {
            return Err(ExtractError::NotAPlaylistPage(page_url.to_string()));
        }

        let id = playlist_id_from_url(page_url)
            .ok_or_else(|| ExtractError::MissingPlaylistId(page_url.to_string()))?;
        let url = clean_playlist_url(page_url);

        let title = document
            .select(&self.playlist_title)
            .map(|el| text_content(&el))
            .find(|t| !t.is_empty())
            .or_else(|| {
                debug!("Title not found with primary selectors, trying any h1");
                document
                    .select(&self.any_h1)
                    .map(|el| text_content(&el))
                    .find(|t| !t.is_empty() && t.chars().count() < MAX_FALLBACK_TITLE_LEN)
            });

        let Some(title) = title else {
            warn!("Could not find playlist title for {}", id);
            return Ok(PlaylistMetadata {
                title: format!("Playlist {}", id),
                id,
                video_count: 0,
                url,
                extracted_at: now,
            });
        };

        let video_count = match document.select(&self.playlist_stats).next() {
            Some(stats) => self.parse_video_count(&text_content(&stats)),
            None => {
                warn!("Stats element not found for {}", id);
                0
            }
        };

        Ok(PlaylistMetadata {
            id,
            title,
            video_count,
            url,
            extracted_at: now,
        })
    }

    /// Extract the playlist shown in a watch page's side panel.
    ///
    /// Returns `Ok(None)` when the panel title is not present.
    pub fn extract_watch_metadata(
        &self,
        document: &Html,
        page_url: &Url,
        now: DateTime<Utc>,
    ) -> Result<Option<PlaylistMetadata>, ExtractError> {
        if PageKind::from_url(page_url.as_str()) != PageKind::WatchPlaylist {
            return Err(ExtractError::NotAPlaylistPage(page_url.to_string()));
        }

        let id = playlist_id_from_url(page_url)
            .ok_or_else(|| ExtractError::MissingPlaylistId(page_url.to_string()))?;

        let title = self
            .watch_panel_titles
            .iter()
            .find_map(|sel| document.select(sel).next())
            .map(|el| text_content(&el))
            .filter(|t| !t.is_empty());

        let Some(title) = title else {
            warn!("Playlist title not found on watch page for {}", id);
            return Ok(None);
        };

        Ok(Some(PlaylistMetadata {
            url: format!("https://www.youtube.com/playlist?list={}", id),
            id,
            title,
            video_count: 0,
            extracted_at: now,
        }))
    }

    /// Extract every playlist entry, up to the configured maximum.
    pub fn extract_videos(&self, document: &Html) -> Vec<Video> {
        let mut videos = Vec::new();

        for (index, element) in document.select(&self.video_items).enumerate() {
            if videos.len() >= self.max_videos {
                warn!("Hit max playlist size limit: {}", self.max_videos);
                break;
            }
            videos.push(self.extract_video(element, index));
        }

        if videos.is_empty() {
            warn!("No videos found");
        } else {
            debug!("Extracted {} videos", videos.len());
        }

        videos
    }

    /// Extract a single playlist entry.
    pub fn extract_video(&self, element: ElementRef, index: usize) -> Video {
        let id = element
            .select(&self.video_link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| self.extract_video_id(href));

        let title = element
            .select(&self.video_title)
            .next()
            .map(|el| text_content(&el))
            .unwrap_or_default();

        let duration_seconds = parse_duration(&self.duration_text(element));

        let is_watched = element.select(&self.watched_badge).next().is_some();

        let lowered = title.to_lowercase();
        let is_unavailable = element.value().attr("is-dismissed").is_some()
            || lowered.contains("[deleted video]")
            || lowered.contains("[private video]");

        Video {
            id,
            title: if title.is_empty() {
                format!("Video {}", index + 1)
            } else {
                title
            },
            duration_seconds,
            index,
            is_watched,
            is_unavailable,
        }
    }

    /// Timestamp text of an entry's duration overlay.
    fn duration_text(&self, element: ElementRef) -> String {
        let Some(overlay) = element.select(&self.video_duration).next() else {
            return String::new();
        };

        let text = text_content(&overlay);
        if !text.is_empty() {
            return text;
        }

        overlay
            .select(&self.duration_label)
            .next()
            .and_then(|span| span.value().attr("aria-label"))
            .unwrap_or_default()
            .to_string()
    }

    /// Pull the `v=` video ID out of a watch link.
    pub fn extract_video_id(&self, href: &str) -> Option<VideoId> {
        self.video_id_re
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| VideoId::from(m.as_str()))
    }

    /// Parse the advertised count from header text like "1,234 videos".
    pub fn parse_video_count(&self, text: &str) -> u32 {
        self.video_count_re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
            .unwrap_or(0)
    }

    /// Whether the entry for `video_id` carries a watched badge.
    ///
    /// Looks at both playlist-page entries and watch-page panel entries.
    pub fn is_marked_watched(&self, document: &Html, video_id: &VideoId) -> bool {
        for item in document.select(&self.panel_items) {
            let matches = item
                .select(&self.panel_link)
                .next()
                .and_then(|link| link.value().attr("href"))
                .and_then(|href| self.extract_video_id(href))
                .is_some_and(|id| &id == video_id);

            if matches {
                return item.select(&self.watched_badge).next().is_some();
            }
        }
        false
    }
}

/// The `list=` parameter of a page URL.
pub fn playlist_id_from_url(url: &Url) -> Option<PlaylistId> {
    url.query_pairs()
        .find(|(key, value)| key == "list" && !value.is_empty())
        .map(|(_, value)| PlaylistId::from(value.into_owned()))
}

/// The `v=` parameter of a watch page URL.
pub fn current_video_id(url: &Url) -> Option<VideoId> {
    url.query_pairs()
        .find(|(key, value)| key == "v" && !value.is_empty())
        .map(|(_, value)| VideoId::from(value.into_owned()))
}

/// Drop everything after the first `&` (index, pp, ...).
pub fn clean_playlist_url(url: &Url) -> String {
    let full = url.as_str();
    full.split('&').next().unwrap_or(full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAYLIST_PAGE: &str = include_str!("../../fixtures/playlist_page.html");
    const WATCH_PAGE: &str = include_str!("../../fixtures/watch_page.html");

    fn extractor() -> PlaylistExtractor {
        PlaylistExtractor::with_defaults().unwrap()
    }

    fn playlist_url() -> Url {
        Url::parse("https://www.youtube.com/playlist?list=PLrust42&index=3").unwrap()
    }

    fn watch_url(video: &str) -> Url {
        Url::parse(&format!(
            "https://www.youtube.com/watch?v={}&list=PLrust42&index=2",
            video
        ))
        .unwrap()
    }

    #[test]
    fn test_default_selectors_compile() {
        assert!(PlaylistExtractor::with_defaults().is_ok());
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let mut config = ExtractConfig::default();
        config.selectors.video_items = "ytd-playlist-video-renderer[".to_string();

        match PlaylistExtractor::new(&config) {
            Err(ExtractError::InvalidSelector { selector, .. }) => {
                assert_eq!(selector, "ytd-playlist-video-renderer[");
            }
            other => panic!("expected InvalidSelector, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_extract_metadata() {
        let document = Html::parse_document(PLAYLIST_PAGE);
        let now = Utc::now();
        let metadata = extractor()
            .extract_metadata(&document, &playlist_url(), now)
            .unwrap();

        assert_eq!(metadata.id, PlaylistId::from("PLrust42"));
        assert_eq!(metadata.title, "Rust in Practice");
        assert_eq!(metadata.video_count, 6);
        assert_eq!(metadata.url, "https://www.youtube.com/playlist?list=PLrust42");
        assert_eq!(metadata.extracted_at, now);
    }

    #[test]
    fn test_extract_metadata_rejects_other_pages() {
        let document = Html::parse_document(PLAYLIST_PAGE);
        let err = extractor()
            .extract_metadata(&document, &watch_url("bbb222"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotAPlaylistPage(_)));
    }

    #[test]
    fn test_extract_metadata_requires_playlist_id() {
        let document = Html::parse_document(PLAYLIST_PAGE);
        let url = Url::parse("https://www.youtube.com/playlist?foo=bar").unwrap();
        let err = extractor()
            .extract_metadata(&document, &url, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingPlaylistId(_)));
    }

    #[test]
    fn test_extract_metadata_falls_back_to_any_h1() {
        let html = r#"<html><body><h1>  </h1><h1>Weekend Watching</h1></body></html>"#;
        let document = Html::parse_document(html);
        let metadata = extractor()
            .extract_metadata(&document, &playlist_url(), Utc::now())
            .unwrap();

        assert_eq!(metadata.title, "Weekend Watching");
        assert_eq!(metadata.video_count, 0);
    }

    #[test]
    fn test_extract_metadata_without_title_uses_id() {
        let document = Html::parse_document("<html><body><p>loading</p></body></html>");
        let metadata = extractor()
            .extract_metadata(&document, &playlist_url(), Utc::now())
            .unwrap();

        assert_eq!(metadata.title, "Playlist PLrust42");
        assert_eq!(metadata.video_count, 0);
    }

    #[test]
    fn test_extract_videos() {
        let document = Html::parse_document(PLAYLIST_PAGE);
        let videos = extractor().extract_videos(&document);

        assert_eq!(videos.len(), 7);

        let summary: Vec<(Option<&str>, &str, u64, bool, bool)> = videos
            .iter()
            .map(|v| {
                (
                    v.id.as_ref().map(|id| id.as_str()),
                    v.title.as_str(),
                    v.duration_seconds,
                    v.is_watched,
                    v.is_unavailable,
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                (Some("aaa111"), "Ownership and Borrowing", 750, true, false),
                (Some("bbb222"), "Lifetimes Explained", 3723, false, false),
                (Some("ccc333"), "[Deleted video]", 0, false, true),
                (Some("ddd444"), "[Private video]", 0, false, true),
                (Some("eee555"), "Traits in Depth", 2700, false, true),
                (Some("fff666"), "Async Rust", 599, false, false),
                (None, "Video 7", 180, false, false),
            ]
        );

        let indexes: Vec<usize> = videos.iter().map(|v| v.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_extract_videos_respects_max() {
        let config = ExtractConfig {
            max_videos: 2,
            ..Default::default()
        };
        let document = Html::parse_document(PLAYLIST_PAGE);
        let videos = PlaylistExtractor::new(&config)
            .unwrap()
            .extract_videos(&document);

        assert_eq!(videos.len(), 2);
    }

    #[test]
    fn test_duration_falls_back_to_aria_label() {
        let html = r#"
            <ytd-playlist-video-renderer>
              <ytd-thumbnail-overlay-time-status-renderer>
                <span id="text" aria-label="4:05"></span>
              </ytd-thumbnail-overlay-time-status-renderer>
              <a id="video-title" href="/watch?v=xyz">Short one</a>
            </ytd-playlist-video-renderer>"#;
        let document = Html::parse_document(html);
        let videos = extractor().extract_videos(&document);

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].duration_seconds, 245);
    }

    #[test]
    fn test_parse_playlist() {
        let playlist = extractor()
            .parse_playlist(PLAYLIST_PAGE, &playlist_url(), Utc::now())
            .unwrap();

        assert_eq!(playlist.videos.len(), 7);
        assert_eq!(playlist.statistics.total_videos, 7);
        assert_eq!(playlist.statistics.available_videos, 4);
        assert_eq!(playlist.statistics.unavailable_count, 3);
        assert_eq!(playlist.statistics.total_duration, 5252);
        assert_eq!(playlist.statistics.watched_count, 1);
        assert_eq!(playlist.statistics.remaining_videos, 3);
        assert_eq!(playlist.statistics.remaining_duration, 4502);
        assert_eq!(playlist.statistics.percent_complete, 25);
        assert_eq!(playlist.custom_name, None);
    }

    #[test]
    fn test_parse_playlist_with_no_videos() {
        let html = r#"<h1 class="ytd-playlist-header-renderer">Empty</h1>"#;
        let playlist = extractor()
            .parse_playlist(html, &playlist_url(), Utc::now())
            .unwrap();

        assert!(playlist.videos.is_empty());
        assert_eq!(playlist.statistics.total_videos, 0);
        assert_eq!(playlist.statistics.percent_complete, 0);
    }

    #[test]
    fn test_extract_watch_metadata() {
        let document = Html::parse_document(WATCH_PAGE);
        let metadata = extractor()
            .extract_watch_metadata(&document, &watch_url("bbb222"), Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(metadata.id, PlaylistId::from("PLrust42"));
        assert_eq!(metadata.title, "Rust in Practice");
        assert_eq!(metadata.video_count, 0);
        assert_eq!(
            metadata.url,
            "https://www.youtube.com/playlist?list=PLrust42"
        );
    }

    #[test]
    fn test_extract_watch_metadata_missing_panel() {
        let document = Html::parse_document("<html><body></body></html>");
        let metadata = extractor()
            .extract_watch_metadata(&document, &watch_url("bbb222"), Utc::now())
            .unwrap();
        assert!(metadata.is_none());
    }

    #[test]
    fn test_is_marked_watched() {
        let ex = extractor();
        let watch = Html::parse_document(WATCH_PAGE);

        assert!(ex.is_marked_watched(&watch, &VideoId::from("bbb222")));
        assert!(!ex.is_marked_watched(&watch, &VideoId::from("fff666")));
        assert!(!ex.is_marked_watched(&watch, &VideoId::from("missing")));

        let playlist = Html::parse_document(PLAYLIST_PAGE);
        assert!(ex.is_marked_watched(&playlist, &VideoId::from("aaa111")));
    }

    #[test]
    fn test_extract_video_id() {
        let ex = extractor();
        assert_eq!(
            ex.extract_video_id("/watch?v=abc123&list=PL1&index=2"),
            Some(VideoId::from("abc123"))
        );
        assert_eq!(
            ex.extract_video_id("https://www.youtube.com/watch?list=PL1&v=xyz"),
            Some(VideoId::from("xyz"))
        );
        assert_eq!(ex.extract_video_id("/shorts/abc123"), None);
    }

    #[test]
    fn test_parse_video_count() {
        let ex = extractor();
        assert_eq!(ex.parse_video_count("24 videos 1,000 views"), 24);
        assert_eq!(ex.parse_video_count("1,234 videos"), 1234);
        assert_eq!(ex.parse_video_count("1 Video"), 1);
        assert_eq!(ex.parse_video_count("No views yet"), 0);
    }

    #[test]
    fn test_url_helpers() {
        let url = watch_url("bbb222");
        assert_eq!(playlist_id_from_url(&url), Some(PlaylistId::from("PLrust42")));
        assert_eq!(current_video_id(&url), Some(VideoId::from("bbb222")));
        assert_eq!(
            clean_playlist_url(&url),
            "https://www.youtube.com/watch?v=bbb222"
        );

        let bare = Url::parse("https://www.youtube.com/").unwrap();
        assert_eq!(playlist_id_from_url(&bare), None);
        assert_eq!(current_video_id(&bare), None);
    }
}
