//! Display formatting for stopwatch durations

/// Format milliseconds as "MM:SS,cc"
///
/// Minutes wrap at 60 the way a clock face does; hours are not shown.
pub fn format_lap_clock(ms: u64) -> String {
    let total_secs = ms / 1000;
    let cs = (ms % 1000) / 10;
    let m = (total_secs / 60) % 60;
    let s = total_secs % 60;
    format!("{:02}:{:02},{:02}", m, s, cs)
}
