//! Statistics and plan calculation.
//!
//! Pure functions over scraped playlist data:
//! - Playlist statistics (counts, durations, completion percentage)
//! - Playback speed adjustment
//! - Days to finish under a daily time budget
//! - Completion date and videos-per-day pacing

use chrono::{Days, NaiveDate};

use crate::models::{DaysToFinish, PlanResult, PlaylistStatistics, Video};

/// Aggregate counts and durations from a video list.
///
/// Unavailable videos only contribute to `total_videos` and
/// `unavailable_count`.
pub fn compute_statistics(videos: &[Video]) -> PlaylistStatistics {
    let mut stats = PlaylistStatistics {
        total_videos: videos.len() as u32,
        ..Default::default()
    };

    for video in videos {
        if !video.is_available() {
            stats.unavailable_count += 1;
            continue;
        }

        stats.available_videos += 1;
        stats.total_duration = stats.total_duration.saturating_add(video.duration_seconds);

        if video.is_remaining() {
            stats.remaining_videos += 1;
            stats.remaining_duration = stats
                .remaining_duration
                .saturating_add(video.duration_seconds);
        } else {
            stats.watched_count += 1;
        }
    }

    stats.percent_complete = calculate_percent(stats.watched_count, stats.available_videos);
    stats
}

/// Rounded completion percentage, 0 when nothing is available.
pub fn calculate_percent(watched: u32, available: u32) -> u32 {
    if available == 0 {
        0
    } else {
        (watched as f64 / available as f64 * 100.0).round() as u32
    }
}

/// Seconds needed to watch `seconds` of content at `speed`, rounded up.
/// A non-positive or non-finite speed counts as 1x.
pub fn apply_playback_speed(seconds: u64, speed: f64) -> u64 {
    let speed = if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    };
    (seconds as f64 / speed).ceil() as u64
}

/// Days needed to watch `seconds` with `daily_minutes` per day.
pub fn calculate_days(seconds: u64, daily_minutes: f64) -> DaysToFinish {
    if !daily_minutes.is_finite() || daily_minutes <= 0.0 {
        return DaysToFinish::Unbounded;
    }

    let minutes = seconds as f64 / 60.0;
    DaysToFinish::Days((minutes / daily_minutes).ceil() as u64)
}

/// Calendar date `days` after `start`.
pub fn calculate_completion_date(days: DaysToFinish, start: NaiveDate) -> Option<NaiveDate> {
    let days = days.days()?;
    start.checked_add_days(Days::new(days))
}

/// How many videos to watch per day to keep pace.
///
/// Small rates are rounded up, larger ones to the nearest whole video, and
/// the result never drops below one while there is a plan to follow.
pub fn calculate_videos_per_day(remaining_videos: u32, days: DaysToFinish) -> u32 {
    let rate = match days {
        DaysToFinish::Days(0) => return remaining_videos,
        DaysToFinish::Days(n) => remaining_videos as f64 / n as f64,
        DaysToFinish::Unbounded => 0.0,
    };

    if rate < 1.0 {
        1
    } else if rate < 5.0 {
        rate.ceil() as u32
    } else {
        rate.round() as u32
    }
}

/// Build a completion plan for the remaining part of a playlist.
pub fn compute_plan(
    stats: &PlaylistStatistics,
    speed: f64,
    daily_minutes: f64,
    today: NaiveDate,
) -> PlanResult {
    let adjusted_remaining_seconds = apply_playback_speed(stats.remaining_duration, speed);
    let days_to_finish = calculate_days(adjusted_remaining_seconds, daily_minutes);

    PlanResult {
        adjusted_remaining_seconds,
        days_to_finish,
        completion_date: calculate_completion_date(days_to_finish, today),
        videos_per_day: calculate_videos_per_day(stats.remaining_videos, days_to_finish),
    }
}
