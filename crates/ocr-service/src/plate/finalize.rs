//! Final validation shared by both recognition strategies.

use super::tokens::{core_len, normalize_plate_text};

/// Normalize `candidate` and accept it with `score` when its dash-stripped
/// length lies within `[min_len, max_len]`.
///
/// Returns `("", 0)` otherwise. A non-empty plate always carries a positive
/// score and an empty plate always carries 0.
pub fn finalize(candidate: &str, min_len: usize, max_len: usize, score: u32) -> (String, u32) {
    let plate = normalize_plate_text(candidate);
    let len = core_len(&plate);
    if plate.is_empty() || score == 0 || len < min_len || len > max_len {
        return (String::new(), 0);
    }
    (plate, score)
}
