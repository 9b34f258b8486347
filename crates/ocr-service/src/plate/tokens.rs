//! Word annotations to plate tokens.

use super::geometry::box_from_vertices;
use common::plates::{PixelBox, RawWordAnnotation};

/// A normalized word inside the plate zone
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub bbox: PixelBox,
    pub area: i64,
    pub center_x: f64,
    pub center_y: f64,
    /// At least 1
    pub width: i64,
    /// At least 1
    pub height: i64,
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: PixelBox) -> Self {
        let (center_x, center_y) = bbox.center();
        Self {
            text: text.into(),
            bbox,
            area: bbox.area(),
            center_x,
            center_y,
            width: bbox.width().max(1),
            height: bbox.height().max(1),
        }
    }
}

/// Canonical plate text: ASCII uppercase, only `[A-Z0-9-]`, dash runs
/// collapsed, no leading or trailing dash. Idempotent.
pub fn normalize_plate_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_uppercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if c == '-' && !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Length of the text without dashes
pub fn core_len(text: &str) -> usize {
    text.chars().filter(|&c| c != '-').count()
}

/// Tokens whose box center lies inside `zone`.
///
/// `words` must not contain the full-text block. Words with empty text,
/// unusable vertices, a zero-area box, or fewer than `min_core_len`
/// characters after normalization are dropped.
pub fn build_tokens(words: &[RawWordAnnotation], zone: PixelBox, min_core_len: usize) -> Vec<Token> {
    words
        .iter()
        .filter_map(|word| {
            let text = word.text.trim();
            if text.is_empty() {
                return None;
            }

            let bbox = box_from_vertices(&word.vertices)?;
            if bbox.is_degenerate() {
                return None;
            }

            let (cx, cy) = bbox.center();
            if !zone.contains_point(cx, cy) {
                return None;
            }

            let normalized = normalize_plate_text(text);
            if core_len(&normalized) < min_core_len {
                return None;
            }

            Some(Token::new(normalized, bbox))
        })
        .collect()
}
