//! Common display utilities and helpers

use chrono::{DateTime, Utc};

/// Placeholder for values that are unknown or absent
pub const MISSING: &str = "--";

/// Truncate string to max characters with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an RFC 3339 timestamp as `YYYY-MM-DD HH:MM`, or pass it through
pub fn format_timestamp(timestamp: &str) -> String {
    match timestamp.parse::<DateTime<Utc>>() {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Render a tri-state SAST flag
pub fn sast_state(enabled: Option<bool>) -> String {
    match enabled {
        Some(true) => "enabled".to_string(),
        Some(false) => "disabled".to_string(),
        None => MISSING.to_string(),
    }
}
