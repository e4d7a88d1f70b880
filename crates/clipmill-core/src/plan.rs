// crates/clipmill-core/src/plan.rs
//
// Duration-split planning: which time ranges become which output files, and
// what progress each finished part maps to. Kept as pure functions so the
// split job stays a thin loop over this plan.

/// One segment of a duration split. `index` is zero-based; the output file
/// number shown to the user is `index + 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPart {
    pub index: usize,
    pub start: f64,
    pub end:   f64,
}

/// Partition `[0, total_secs)` into consecutive `part_secs`-long pieces.
///
/// `num_parts = ceil(total / part)`; the final piece is clamped to the total
/// duration. Degenerate pieces (start ≥ end, possible when the total is an
/// exact multiple and float rounding leaves a zero-length tail) are dropped.
pub fn split_parts(total_secs: f64, part_secs: u32) -> Vec<SplitPart> {
    if total_secs <= 0.0 || part_secs == 0 {
        return Vec::new();
    }
    let part = part_secs as f64;
    let num_parts = (total_secs / part).ceil() as usize;

    (0..num_parts)
        .filter_map(|i| {
            let start = i as f64 * part;
            let end = ((i + 1) as f64 * part).min(total_secs);
            (start < end).then_some(SplitPart { index: i, start, end })
        })
        .collect()
}

/// Output file name for one split part: `{stem}_part_{n}.mp4`, numbered from 1.
pub fn part_file_name(stem: &str, index: usize) -> String {
    format!("{stem}_part_{}.mp4", index + 1)
}

/// Percent complete after `done` of `total` parts, rounded to nearest.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uneven_total_gets_a_short_tail() {
        // 125 s at 60 s per part → three parts, the last one 5 s long.
        let parts = split_parts(125.0, 60);
        assert_eq!(parts.len(), 3);
        assert_eq!((parts[0].start, parts[0].end), (0.0, 60.0));
        assert_eq!((parts[1].start, parts[1].end), (60.0, 120.0));
        assert_eq!((parts[2].start, parts[2].end), (120.0, 125.0));
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let parts = split_parts(60.0, 60);
        assert_eq!(parts.len(), 1);
        assert_eq!((parts[0].start, parts[0].end), (0.0, 60.0));
    }

    #[test]
    fn part_shorter_than_total_of_one() {
        let parts = split_parts(5.0, 60);
        assert_eq!(parts.len(), 1);
        assert_eq!((parts[0].start, parts[0].end), (0.0, 5.0));
    }

    #[test]
    fn zero_inputs_plan_nothing() {
        assert!(split_parts(0.0, 60).is_empty());
        assert!(split_parts(125.0, 0).is_empty());
    }

    #[test]
    fn file_names_number_from_one() {
        assert_eq!(part_file_name("holiday", 0), "holiday_part_1.mp4");
        assert_eq!(part_file_name("holiday", 2), "holiday_part_3.mp4");
    }

    #[test]
    fn progress_sequence_for_three_parts() {
        let seq: Vec<u8> = (1..=3).map(|i| progress_percent(i, 3)).collect();
        assert_eq!(seq, vec![33, 67, 100]);
    }

    #[test]
    fn progress_reaches_exactly_100() {
        for total in 1..=10 {
            assert_eq!(progress_percent(total, total), 100);
        }
    }
}
