//! # Playlist Planner
//!
//! A local YouTube playlist watch-time planner.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (videos, playlists, statistics, plans)
//! - **extract**: DOM snapshot scraping for playlist and watch pages
//! - **calculate**: Statistics aggregation and plan arithmetic
//! - **storage**: Local key-value store of JSON blobs
//! - **ingest**: Scrape, merge saved progress, recompute and persist
//! - **fetch**: Page snapshot downloading with an on-disk cache
//! - **format**: Human-friendly durations and dates
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod ingest;
pub mod models;
pub mod storage;

pub use calculate::{compute_plan, compute_statistics};
pub use models::*;

use tracing::warn;

/// Anything longer than a day is almost certainly a scraping mistake.
const SUSPICIOUS_DURATION_SECS: u64 = 86_400;

/// Parse a YouTube timestamp (`"H:MM:SS"`, `"MM:SS"` or `":SS"`) to seconds.
///
/// Text without a colon, and any part that is not a number, count as zero.
pub fn parse_duration(text: &str) -> u64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();

    if !cleaned.contains(':') {
        return 0;
    }

    let parts: Vec<u64> = cleaned
        .split(':')
        .map(|part| part.trim().parse().unwrap_or(0))
        .collect();

    let seconds = match parts.as_slice() {
        [h, m, s] => h
            .saturating_mul(3600)
            .saturating_add(m.saturating_mul(60))
            .saturating_add(*s),
        [m, s] => m.saturating_mul(60).saturating_add(*s),
        [s] => *s,
        _ => 0,
    };

    if is_suspicious_duration(seconds) {
        warn!("Parsed unusually long duration: {:?} => {}s", text, seconds);
    }

    seconds
}

/// Whether a parsed duration is longer than any real video.
pub fn is_suspicious_duration(seconds: u64) -> bool {
    seconds > SUSPICIOUS_DURATION_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("1:23:45"), 5025);
    }

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("9:59"), 599);
        assert_eq!(parse_duration("10:30"), 630);
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("bad"), 0);
    }

    #[test]
    fn test_parse_duration_empty() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("   "), 0);
    }

    #[test]
    fn test_parse_duration_requires_colon() {
        assert_eq!(parse_duration("45"), 0);
    }

    #[test]
    fn test_parse_duration_leading_colon() {
        assert_eq!(parse_duration(":45"), 45);
    }

    #[test]
    fn test_parse_duration_whitespace_and_commas() {
        assert_eq!(parse_duration("  \n 1:02:03 \n"), 3723);
        assert_eq!(parse_duration("1,000:00"), 60_000);
    }

    #[test]
    fn test_parse_duration_non_numeric_parts() {
        assert_eq!(parse_duration("x:30"), 30);
        assert_eq!(parse_duration("LIVE:"), 0);
    }

    #[test]
    fn test_parse_duration_too_many_parts() {
        assert_eq!(parse_duration("1:2:3:4"), 0);
    }

    #[test]
    fn test_parse_duration_large() {
        assert_eq!(parse_duration("30:00:00"), 108_000);
    }

    #[test]
    fn test_suspicious_duration_threshold() {
        assert!(!is_suspicious_duration(86_400));
        assert!(is_suspicious_duration(86_401));
        assert!(!is_suspicious_duration(parse_duration("24:00:00")));
        assert!(is_suspicious_duration(parse_duration("24:00:01")));
    }
}
