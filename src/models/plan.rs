//! Watch plan results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of days needed to finish a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaysToFinish {
    Days(u64),

    /// No daily budget, so the playlist is never finished
    Unbounded,
}

impl DaysToFinish {
    pub fn days(&self) -> Option<u64> {
        match self {
            DaysToFinish::Days(n) => Some(*n),
            DaysToFinish::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, DaysToFinish::Unbounded)
    }
}

impl std::fmt::Display for DaysToFinish {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaysToFinish::Days(n) => write!(f, "{}", n),
            DaysToFinish::Unbounded => write!(f, "∞"),
        }
    }
}

/// A completion estimate for the remaining part of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Remaining seconds after applying playback speed
    pub adjusted_remaining_seconds: u64,

    pub days_to_finish: DaysToFinish,

    /// `None` when `days_to_finish` is unbounded
    pub completion_date: Option<NaiveDate>,

    pub videos_per_day: u32,
}
