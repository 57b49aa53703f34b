//! Human-friendly durations and dates.

use chrono::{Days, NaiveDate};

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Format seconds as `"2h 30m"` (short) or `"2 hours 30 minutes"`.
///
/// Seconds are only shown for durations under an hour.
pub fn format_duration(seconds: u64, short: bool) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(if short {
            format!("{}h", hours)
        } else {
            plural(hours, "hour")
        });
    }
    if minutes > 0 {
        parts.push(if short {
            format!("{}m", minutes)
        } else {
            plural(minutes, "minute")
        });
    }
    if secs > 0 && hours == 0 {
        parts.push(if short {
            format!("{}s", secs)
        } else {
            plural(secs, "second")
        });
    }

    if parts.is_empty() {
        return if short { "0m" } else { "0 minutes" }.to_string();
    }
    parts.join(" ")
}

/// Coarse "time left" label for a remaining duration.
pub fn time_remaining_text(seconds: u64) -> String {
    if seconds == 0 {
        return "Complete!".to_string();
    }

    let hours = seconds as f64 / 3600.0;
    if hours < 1.0 {
        format!("{} min left", seconds.div_ceil(60))
    } else if hours < 24.0 {
        let h = hours.ceil() as u64;
        format!("{} hr{} left", h, if h == 1 { "" } else { "s" })
    } else {
        let days = (hours / 24.0).ceil() as u64;
        format!("{} day{} left", days, if days == 1 { "" } else { "s" })
    }
}

/// `"Today"`, `"Tomorrow"`, or a date like `"Oct 16, 2026"`.
pub fn format_date(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.checked_add_days(Days::new(1)) == Some(date) {
        "Tomorrow".to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}
