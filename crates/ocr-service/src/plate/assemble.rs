//! Left-to-right assembly of a line into candidate plate text.

use super::lines::LineCluster;
use super::tokens::{normalize_plate_text, Token};

/// Concatenate a line's tokens in reading order.
///
/// A dash is inserted between neighbours separated by more than
/// `gap_ratio` times the mean token width, unless either side already ends
/// or starts with one. The result is normalized.
pub fn assemble_line(line: &LineCluster, gap_ratio: f64) -> String {
    let mut tokens: Vec<&Token> = line.tokens.iter().collect();
    if tokens.is_empty() {
        return String::new();
    }
    tokens.sort_by(|a, b| a.center_x.total_cmp(&b.center_x));

    let avg_width = tokens.iter().map(|t| t.width as f64).sum::<f64>() / tokens.len() as f64;
    let min_gap = avg_width * gap_ratio;

    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        if let Some(p) = prev {
            let gap = (token.bbox.x1 - p.bbox.x2) as f64;
            if gap > min_gap && !out.ends_with('-') && !token.text.starts_with('-') {
                out.push('-');
            }
        }
        out.push_str(&token.text);
        prev = Some(token);
    }

    normalize_plate_text(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::config::LineGrouping;
    use crate::plate::lines::cluster_lines;
    use common::plates::PixelBox;

    fn line(tokens: Vec<Token>) -> LineCluster {
        let mut lines = cluster_lines(tokens, 10.0, LineGrouping::Greedy);
        assert_eq!(lines.len(), 1);
        lines.remove(0)
    }

    fn token(text: &str, x1: i64, x2: i64) -> Token {
        Token::new(text, PixelBox::new(x1, 70, x2, 90))
    }

    #[test]
    fn test_tokens_are_joined_in_reading_order() {
        // Adjacent boxes: gap 5 against a threshold of 7
        let assembled = assemble_line(&line(vec![token("12", 65, 85), token("AB", 40, 60)]), 0.35);
        assert_eq!(assembled, "AB12");
    }

    #[test]
    fn test_wide_gap_inserts_dash() {
        // gap 30 > 20 * 0.35
        let assembled = assemble_line(&line(vec![token("AB", 40, 60), token("123", 90, 110)]), 0.35);
        assert_eq!(assembled, "AB-123");
    }

    #[test]
    fn test_existing_dash_is_not_doubled() {
        let assembled = assemble_line(
            &line(vec![token("AB-", 40, 60), token("123", 90, 110), token("-CD", 140, 160)]),
            0.35,
        );
        assert_eq!(assembled, "AB-123-CD");
    }

    #[test]
    fn test_overlapping_tokens_have_no_separator() {
        let assembled = assemble_line(&line(vec![token("AB", 40, 60), token("CD", 55, 75)]), 0.35);
        assert_eq!(assembled, "ABCD");
    }

    #[test]
    fn test_empty_line_assembles_to_nothing() {
        let empty = LineCluster {
            tokens: vec![],
            sum_area: 0,
            sum_height: 0,
            count: 0,
            mean_y: 0.0,
        };
        assert_eq!(assemble_line(&empty, 0.35), "");
    }
}
