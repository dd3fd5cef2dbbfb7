/// Wraps `value` into `0..len`, in both directions. Returns `0` when `len` is zero.
#[must_use]
pub const fn wrap_index(value: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    value.rem_euclid(len as isize) as usize
}

/// Formats a song position as `mm:ss.ss`. Negative and non-finite positions show as zero.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    let centis = if seconds.is_finite() {
        (seconds * 100.0).round().max(0.0) as u64
    } else {
        0
    };
    let minutes = centis / 6000;
    let rest = centis % 6000;
    format!("{minutes:02}:{:02}.{:02}", rest / 100, rest % 100)
}
