//! User settings and saved progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::VideoId;

/// Playback speeds offered by the planner.
pub const PLAYBACK_SPEEDS: [f64; 4] = [1.0, 1.25, 1.5, 2.0];

/// Daily budget presets in minutes.
pub const DAILY_MINUTES_PRESETS: [f64; 4] = [15.0, 30.0, 45.0, 60.0];

pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.25;
pub const DEFAULT_DAILY_MINUTES: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// Planner settings shared by every playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_playback_speed")]
    pub playback_speed: f64,

    #[serde(default = "default_daily_minutes")]
    pub daily_minutes: f64,

    #[serde(default)]
    pub theme: Theme,
}

fn default_playback_speed() -> f64 {
    DEFAULT_PLAYBACK_SPEED
}

fn default_daily_minutes() -> f64 {
    DEFAULT_DAILY_MINUTES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback_speed: default_playback_speed(),
            daily_minutes: default_daily_minutes(),
            theme: Theme::default(),
        }
    }
}

/// A partial settings change; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub playback_speed: Option<f64>,
    pub daily_minutes: Option<f64>,
    pub theme: Option<Theme>,
}

impl Settings {
    /// Merge a partial update into these settings.
    pub fn merge(mut self, update: &SettingsUpdate) -> Self {
        if let Some(speed) = update.playback_speed {
            self.playback_speed = speed;
        }
        if let Some(minutes) = update.daily_minutes {
            self.daily_minutes = minutes;
        }
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        self
    }

    /// Whether speed and daily budget are both among the offered presets.
    pub fn is_preset(&self) -> bool {
        PLAYBACK_SPEEDS.contains(&self.playback_speed)
            && DAILY_MINUTES_PRESETS.contains(&self.daily_minutes)
    }
}

/// Watched videos recorded for one playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistProgress {
    #[serde(default)]
    pub watched_videos: Vec<VideoId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl PlaylistProgress {
    pub fn contains(&self, video_id: &VideoId) -> bool {
        self.watched_videos.contains(video_id)
    }

    /// Record a watched video. Returns false if it was already recorded.
    pub fn insert(&mut self, video_id: VideoId) -> bool {
        if self.contains(&video_id) {
            return false;
        }
        self.watched_videos.push(video_id);
        true
    }
}
