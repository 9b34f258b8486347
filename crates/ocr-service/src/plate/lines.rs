//! Grouping tokens into horizontal text lines and picking the plate line.

use super::config::LineGrouping;
use super::tokens::Token;
use common::plates::PixelBox;
use std::cmp::Ordering;

/// Tokens sharing one horizontal band
#[derive(Debug, Clone, PartialEq)]
pub struct LineCluster {
    pub tokens: Vec<Token>,
    pub sum_area: i64,
    pub sum_height: i64,
    pub count: usize,
    /// Running mean of token center heights
    pub mean_y: f64,
}

impl LineCluster {
    fn start(token: Token) -> Self {
        Self {
            sum_area: token.area,
            sum_height: token.height,
            count: 1,
            mean_y: token.center_y,
            tokens: vec![token],
        }
    }

    fn push(&mut self, token: Token) {
        self.sum_area += token.area;
        self.sum_height += token.height;
        self.count += 1;
        self.mean_y += (token.center_y - self.mean_y) / self.count as f64;
        self.tokens.push(token);
    }

    fn absorb(&mut self, other: LineCluster) {
        let total = (self.count + other.count) as f64;
        self.mean_y = (self.mean_y * self.count as f64 + other.mean_y * other.count as f64) / total;
        self.sum_area += other.sum_area;
        self.sum_height += other.sum_height;
        self.count += other.count;
        self.tokens.extend(other.tokens);
    }

    /// Lowest and highest token center heights
    fn center_span(&self) -> (f64, f64) {
        self.tokens.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t.center_y), hi.max(t.center_y))
        })
    }

    pub fn avg_height(&self) -> f64 {
        self.sum_height as f64 / self.count.max(1) as f64
    }

    /// Ranking key: total glyph area, then mean height, then token count
    fn rank(&self, other: &Self) -> Ordering {
        self.sum_area
            .cmp(&other.sum_area)
            .then_with(|| self.avg_height().total_cmp(&other.avg_height()))
            .then_with(|| self.count.cmp(&other.count))
    }
}

/// Vertical distance from a line's mean within which a token joins it
pub fn line_tolerance(zone: PixelBox, ratio: f64) -> f64 {
    (zone.y2 - zone.y1).max(1) as f64 * ratio
}

/// Partition tokens into line clusters ordered top to bottom.
///
/// Tokens are sorted by center height and walked once. A token within
/// `tolerance` of the current cluster's running mean joins it, anything else
/// closes the cluster and starts a new one. Closed clusters never reopen, so
/// the result depends on token order. [`LineGrouping::MergeBands`] adds an
/// interval pass joining neighbouring clusters whose token centers are at most
/// `tolerance` apart.
pub fn cluster_lines(mut tokens: Vec<Token>, tolerance: f64, grouping: LineGrouping) -> Vec<LineCluster> {
    tokens.sort_by(|a, b| a.center_y.total_cmp(&b.center_y));

    let mut lines: Vec<LineCluster> = Vec::new();
    let mut current: Option<LineCluster> = None;

    for token in tokens {
        match current.as_mut() {
            Some(line) if (token.center_y - line.mean_y).abs() <= tolerance => line.push(token),
            _ => {
                if let Some(done) = current.replace(LineCluster::start(token)) {
                    lines.push(done);
                }
            }
        }
    }
    lines.extend(current);

    match grouping {
        LineGrouping::Greedy => lines,
        LineGrouping::MergeBands => merge_bands(lines, tolerance),
    }
}

fn merge_bands(lines: Vec<LineCluster>, tolerance: f64) -> Vec<LineCluster> {
    let mut merged: Vec<LineCluster> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.last_mut() {
            Some(prev) if line.center_span().0 - prev.center_span().1 <= tolerance => {
                prev.absorb(line)
            }
            _ => merged.push(line),
        }
    }
    merged
}

/// The line most likely to be the plate: largest total glyph area, ties
/// broken by mean height and then by token count. Full ties keep the
/// upper line.
pub fn select_best_line(lines: Vec<LineCluster>) -> Option<LineCluster> {
    lines.into_iter().fold(None, |best, line| match best {
        Some(b) if line.rank(&b) != Ordering::Greater => Some(b),
        _ => Some(line),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, x1: i64, y1: i64, x2: i64, y2: i64) -> Token {
        Token::new(text, PixelBox::new(x1, y1, x2, y2))
    }

    fn texts(line: &LineCluster) -> Vec<&str> {
        line.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tolerance_from_zone_height() {
        assert_eq!(line_tolerance(PixelBox::new(0, 100, 10, 140), 0.075), 3.0);
        assert_eq!(line_tolerance(PixelBox::new(0, 0, 0, 0), 0.5), 0.5);
    }

    #[test]
    fn test_tokens_within_tolerance_share_a_line() {
        // centers 100 and 103 with tolerance 3.0
        let tokens = vec![token("CD", 40, 96, 60, 110), token("AB", 10, 94, 30, 106)];
        let lines = cluster_lines(tokens, 3.0, LineGrouping::Greedy);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].count, 2);
        assert_eq!(lines[0].mean_y, 101.5);
        assert_eq!(lines[0].sum_area, 20 * 12 + 20 * 14);
        assert_eq!(lines[0].sum_height, 26);
    }

    #[test]
    fn test_mean_is_updated_incrementally() {
        let tokens = vec![
            token("A1", 0, 98, 10, 102),
            token("B2", 20, 100, 30, 104),
            token("C3", 40, 102, 50, 106),
        ];
        let lines = cluster_lines(tokens, 3.0, LineGrouping::Greedy);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].mean_y - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_walk_never_reopens_a_line() {
        // Drifting centers: 100, 102.5, 105.5. The third is 5.5 from the first
        // token but only 4.25 from the running mean, outside tolerance 4.0.
        let tokens = vec![
            token("AA", 0, 95, 10, 105),
            token("BB", 20, 97, 30, 108),
            token("CC", 40, 100, 50, 111),
        ];
        let lines = cluster_lines(tokens.clone(), 4.0, LineGrouping::Greedy);
        assert_eq!(lines.len(), 2);
        assert_eq!(texts(&lines[0]), vec!["AA", "BB"]);
        assert_eq!(texts(&lines[1]), vec!["CC"]);

        let merged = cluster_lines(tokens, 4.0, LineGrouping::MergeBands);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].count, 3);
    }

    #[test]
    fn test_distinct_bands_are_not_merged() {
        let tokens = vec![
            token("TOP", 0, 10, 30, 20),
            token("AB12", 0, 60, 60, 80),
        ];
        let lines = cluster_lines(tokens, 3.0, LineGrouping::MergeBands);
        assert_eq!(lines.len(), 2);
        assert_eq!(texts(&lines[0]), vec!["TOP"]);
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        assert!(cluster_lines(vec![], 3.0, LineGrouping::Greedy).is_empty());
        assert_eq!(select_best_line(vec![]), None);
    }

    #[test]
    fn test_best_line_prefers_total_area() {
        let lines = cluster_lines(
            vec![
                // one large stray token
                token("DEALER", 0, 0, 60, 20),
                // two plate glyph groups, larger in total
                token("AB", 0, 50, 40, 70),
                token("12", 45, 50, 85, 70),
            ],
            3.0,
            LineGrouping::Greedy,
        );
        let best = select_best_line(lines).unwrap();
        assert_eq!(texts(&best), vec!["AB", "12"]);
    }

    #[test]
    fn test_best_line_ties_on_area_use_height_then_count() {
        // Same total area 400: the taller glyphs win
        let flat = LineCluster::start(token("WIDE", 0, 0, 40, 10));
        let tall = LineCluster::start(token("TALL", 0, 50, 20, 70));
        let best = select_best_line(vec![flat, tall]).unwrap();
        assert_eq!(texts(&best), vec!["TALL"]);

        // Same area and mean height: more tokens win
        let single = LineCluster::start(token("XXXX", 0, 0, 20, 20));
        let mut pair = LineCluster::start(token("AB", 0, 50, 10, 70));
        pair.push(token("12", 12, 50, 22, 70));
        let best = select_best_line(vec![single, pair]).unwrap();
        assert_eq!(best.count, 2);

        // Full tie keeps the first line
        let first = LineCluster::start(token("FIRST", 0, 0, 10, 10));
        let second = LineCluster::start(token("SECOND", 0, 50, 10, 60));
        let best = select_best_line(vec![first, second]).unwrap();
        assert_eq!(texts(&best), vec!["FIRST"]);
    }
}
