use std::time::Instant;

/// Returns a formatted string of elapsed time, e.g.
/// `1min 34.852s`
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{:03}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{:03}s", sub_sec, sub_milli)
}

/// Percentage of `total` items completed once item `i` (zero-based) is done.
pub fn get_progress(i: usize, total: usize) -> usize {
    if total <= 1 {
        return 100;
    }
    (100.0_f64 * i as f64 / (total - 1) as f64) as usize
}
