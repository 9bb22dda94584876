//! Human-readable time strings.

/// `MM:SS` from milliseconds. Partial seconds are dropped; minutes are not capped at 60.
pub fn format_clock(ms: u64) -> String {
    let total = ms / 1000;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// `MM:SS` from a seconds value as found in plan files. Negative counts as zero.
pub fn format_secs(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return format_clock(0);
    }
    format_clock((secs * 1000.0) as u64)
}
