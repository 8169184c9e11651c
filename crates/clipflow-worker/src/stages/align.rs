//! Word-boundary-aligned clip extraction windows (S6, S8).
//!
//! Ported from the original `calculate_padded_boundaries` /
//! `extract_words_in_range`: given a target `[start, end]` window padded
//! around a moment, snap each edge to the nearest word boundary within a
//! small search margin rather than cutting mid-word.

use clipflow_models::WordTimestamp;

/// Margin (seconds) the boundary search extends past the padded target on
/// each side before giving up and falling back to the raw target.
pub const SEARCH_MARGIN_SECS: f64 = 2.0;

/// Default padding (seconds) applied around a moment's raw `[start, end]`.
pub const DEFAULT_CLIP_PADDING_SECS: f64 = 30.0;

/// Compute `[clip_start, clip_end]` for a moment's `[moment_start,
/// moment_end]`, aligned to the nearest word boundaries in `words`.
///
/// Falls back to the unaligned padded window if `words` is empty or no
/// boundary-aligned result is well-formed.
pub fn calculate_padded_boundaries(
    words: &[WordTimestamp],
    moment_start: f64,
    moment_end: f64,
    padding: f64,
    margin: f64,
) -> (f64, f64) {
    let target_start = (moment_start - padding).max(0.0);
    let target_end = moment_end + padding;

    if words.is_empty() {
        return (target_start, target_end);
    }

    let search_start_min = (target_start - margin).max(0.0);
    let search_end_max = target_end + margin;

    let clip_start = find_clip_start(words, target_start, search_start_min);
    let clip_end = find_clip_end(words, target_end, search_end_max);

    match (clip_start, clip_end) {
        (Some(start), Some(end)) if end > start => (start, end),
        (Some(start), Some(end)) => {
            tracing::error!(start, end, "word-aligned boundaries collapsed, falling back to unaligned target");
            (target_start, target_end)
        }
        _ => (target_start, target_end),
    }
}

/// Forward scan: the largest `word.start` that is `<= target_start` while
/// staying `>= search_start_min`; else the first word at/after
/// `search_start_min`.
fn find_clip_start(words: &[WordTimestamp], target_start: f64, search_start_min: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for word in words {
        if word.start < search_start_min {
            continue;
        }
        if word.start > target_start {
            break;
        }
        best = Some(word.start);
    }
    if best.is_some() {
        return best;
    }
    words.iter().find(|w| w.start >= search_start_min).map(|w| w.start)
}

/// Reverse scan: the smallest `word.end` that is `>= target_end` while
/// staying `<= search_end_max`; else the last word at/before
/// `search_end_max`.
fn find_clip_end(words: &[WordTimestamp], target_end: f64, search_end_max: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for word in words.iter().rev() {
        if word.end > search_end_max {
            continue;
        }
        if word.end < target_end {
            break;
        }
        best = Some(word.end);
    }
    if best.is_some() {
        return best;
    }
    words.iter().rev().find(|w| w.end <= search_end_max).map(|w| w.end)
}

/// Words whose span overlaps `[start_time, end_time]` at all.
pub fn extract_words_in_range(words: &[WordTimestamp], start_time: f64, end_time: f64) -> Vec<WordTimestamp> {
    words
        .iter()
        .filter(|w| w.end >= start_time && w.start <= end_time)
        .cloned()
        .collect()
}

/// Shift every word's timestamps so the window starts at `0.0` (S8).
pub fn normalize_words(words: &[WordTimestamp], window_start: f64) -> Vec<WordTimestamp> {
    words
        .iter()
        .map(|w| WordTimestamp {
            word: w.word.clone(),
            start: (w.start - window_start).max(0.0),
            end: (w.end - window_start).max(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(pairs: &[(&str, f64, f64)]) -> Vec<WordTimestamp> {
        pairs
            .iter()
            .map(|(w, s, e)| WordTimestamp {
                word: w.to_string(),
                start: *s,
                end: *e,
            })
            .collect()
    }

    #[test]
    fn empty_transcript_falls_back_to_unaligned_window() {
        let (start, end) = calculate_padded_boundaries(&[], 60.0, 90.0, 30.0, SEARCH_MARGIN_SECS);
        assert_eq!((start, end), (30.0, 120.0));
    }

    #[test]
    fn snaps_to_nearest_word_boundaries() {
        let ws = words(&[
            ("a", 28.0, 28.5),
            ("b", 29.4, 29.9),
            ("c", 90.1, 90.6),
            ("d", 92.0, 92.5),
        ]);
        let (start, end) = calculate_padded_boundaries(&ws, 60.0, 90.0, 30.0, SEARCH_MARGIN_SECS);
        assert_eq!(start, 29.4);
        assert_eq!(end, 90.6);
    }

    #[test]
    fn clamps_start_at_zero() {
        let (start, _) = calculate_padded_boundaries(&[], 5.0, 40.0, 30.0, SEARCH_MARGIN_SECS);
        assert_eq!(start, 0.0);
    }

    #[test]
    fn extract_words_in_range_keeps_overlapping_words_only() {
        let ws = words(&[("a", 0.0, 1.0), ("b", 5.0, 6.0), ("c", 9.0, 11.0)]);
        let extracted = extract_words_in_range(&ws, 4.0, 10.0);
        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted[0].word, "b");
    }

    #[test]
    fn normalize_shifts_to_zero() {
        let ws = words(&[("a", 10.0, 10.5), ("b", 11.0, 11.5)]);
        let normalized = normalize_words(&ws, 10.0);
        assert_eq!(normalized[0].start, 0.0);
        assert_eq!(normalized[1].start, 1.0);
    }
}
