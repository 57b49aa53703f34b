//! Derived playlist statistics.

use serde::{Deserialize, Serialize};

/// Aggregate counts and durations for a playlist.
///
/// Always derived from the video list; recompute it whenever a watched flag
/// changes instead of editing fields in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistStatistics {
    pub total_videos: u32,
    pub available_videos: u32,
    pub unavailable_count: u32,

    /// Seconds across all available videos
    pub total_duration: u64,

    pub watched_count: u32,
    pub remaining_videos: u32,

    /// Seconds across available, unwatched videos
    pub remaining_duration: u64,

    /// 0..=100
    pub percent_complete: u32,
}

impl PlaylistStatistics {
    /// Whether every available video has been watched.
    pub fn is_complete(&self) -> bool {
        self.available_videos > 0 && self.remaining_videos == 0
    }
}
