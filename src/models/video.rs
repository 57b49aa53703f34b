//! Video entries scraped from a playlist.

use serde::{Deserialize, Serialize};

use super::VideoId;

/// A single playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Video ID, absent when the entry carried no watch link
    pub id: Option<VideoId>,

    /// Video title (falls back to "Video N")
    pub title: String,

    /// Duration in seconds, 0 when unknown
    pub duration_seconds: u64,

    /// Zero-based position in the playlist
    pub index: usize,

    /// Whether YouTube (or saved progress) marks the video as watched
    #[serde(default)]
    pub is_watched: bool,

    /// Deleted, private or dismissed entries; excluded from totals
    #[serde(default)]
    pub is_unavailable: bool,
}

impl Video {
    /// Whether this video counts towards durations and completion.
    pub fn is_available(&self) -> bool {
        !self.is_unavailable
    }

    /// Whether this video still needs to be watched.
    pub fn is_remaining(&self) -> bool {
        self.is_available() && !self.is_watched
    }

    /// Whether this entry has the given video ID.
    pub fn has_id(&self, id: &VideoId) -> bool {
        self.id.as_ref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(is_watched: bool, is_unavailable: bool) -> Video {
        Video {
            id: Some(VideoId::from("abc")),
            title: "Lecture 1".to_string(),
            duration_seconds: 600,
            index: 0,
            is_watched,
            is_unavailable,
        }
    }

    #[test]
    fn test_remaining_requires_available_and_unwatched() {
        assert!(video(false, false).is_remaining());
        assert!(!video(true, false).is_remaining());
        assert!(!video(false, true).is_remaining());
    }

    #[test]
    fn test_has_id() {
        let v = video(false, false);
        assert!(v.has_id(&VideoId::from("abc")));
        assert!(!v.has_id(&VideoId::from("xyz")));

        let anonymous = Video { id: None, ..v };
        assert!(!anonymous.has_id(&VideoId::from("abc")));
    }

    #[test]
    fn test_flags_default_when_missing() {
        let json = r#"{"id":null,"title":"t","duration_seconds":5,"index":2}"#;
        let v: Video = serde_json::from_str(json).unwrap();
        assert!(!v.is_watched);
        assert!(!v.is_unavailable);
    }
}
