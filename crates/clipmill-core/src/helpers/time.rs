// crates/clipmill-core/src/helpers/time.rs
//
// Whole-second timecode parsing and formatting shared by the UI time fields
// and the source-info panel. Jobs work in whole seconds; sub-second
// precision never enters the system.

/// Format whole seconds as `HH:MM:SS`.
///
/// ```
/// use clipmill_core::helpers::time::format_timecode;
/// assert_eq!(format_timecode(0),    "00:00:00");
/// assert_eq!(format_timecode(75),   "00:01:15");
/// assert_eq!(format_timecode(3725), "01:02:05");
/// ```
pub fn format_timecode(secs: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
    )
}

/// Parse `HH:MM:SS` or `MM:SS` into whole seconds.
///
/// Minutes and seconds must be below 60; hours are unbounded. Returns `None`
/// for anything else — the caller turns that into a validation dialog.
pub fn parse_timecode(text: &str) -> Option<u32> {
    let fields: Vec<&str> = text.trim().split(':').collect();
    let (h, m, s) = match fields.as_slice() {
        [h, m, s] => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?, s.parse::<u32>().ok()?),
        [m, s]    => (0u32, m.parse::<u32>().ok()?, s.parse::<u32>().ok()?),
        _         => return None,
    };
    if m >= 60 || s >= 60 {
        return None;
    }
    Some(h * 3600 + m * 60 + s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_short_forms() {
        assert_eq!(parse_timecode("00:00:00"), Some(0));
        assert_eq!(parse_timecode("01:02:05"), Some(3725));
        assert_eq!(parse_timecode("02:30"), Some(150));
        assert_eq!(parse_timecode(" 00:01:15 "), Some(75));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert_eq!(parse_timecode("00:61:00"), None);
        assert_eq!(parse_timecode("00:00:75"), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timecode(""), None);
        assert_eq!(parse_timecode("abc"), None);
        assert_eq!(parse_timecode("1:2:3:4"), None);
        assert_eq!(parse_timecode("-1:00:00"), None);
    }

    #[test]
    fn round_trips() {
        for secs in [0u32, 1, 59, 60, 3599, 3600, 86_400] {
            assert_eq!(parse_timecode(&format_timecode(secs)), Some(secs));
        }
    }
}
