//! Plate recognition from plain OCR text lines.
//!
//! Used when no word geometry is available. Each line is reduced to its
//! alphanumeric characters, six-character lines are coerced onto the known
//! plate templates, and every candidate is scored by how closely it follows a
//! plate format.

use once_cell::sync::Lazy;
use regex::Regex;

/// Character class expected at one template position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Digit,
    Letter,
}

impl Slot {
    fn accepts(self, c: char) -> bool {
        match self {
            Slot::Digit => c.is_ascii_digit(),
            Slot::Letter => c.is_ascii_uppercase(),
        }
    }

    fn confusables(self) -> &'static [(char, char)] {
        match self {
            Slot::Digit => DIGIT_CONFUSABLES,
            Slot::Letter => LETTER_CONFUSABLES,
        }
    }
}

use Slot::{Digit as D, Letter as L};

/// `1AB2CD` style plates
pub const DIGIT_LETTER_TEMPLATE: [Slot; 6] = [D, L, L, D, L, L];
/// `ABC123` style plates
pub const LETTER_DIGIT_TEMPLATE: [Slot; 6] = [L, L, L, D, D, D];

/// Templates in preference order; equal costs keep the earlier one
pub const TEMPLATES: [[Slot; 6]; 2] = [DIGIT_LETTER_TEMPLATE, LETTER_DIGIT_TEMPLATE];

/// Letters commonly misread for a digit
pub const DIGIT_CONFUSABLES: &[(char, char)] = &[
    ('O', '0'),
    ('Q', '0'),
    ('D', '0'),
    ('I', '1'),
    ('L', '1'),
    ('Z', '2'),
    ('S', '5'),
    ('G', '6'),
    ('B', '8'),
    ('T', '7'),
    ('M', '6'),
];

/// Digits commonly misread for a letter
pub const LETTER_CONFUSABLES: &[(char, char)] = &[
    ('0', 'O'),
    ('1', 'I'),
    ('2', 'Z'),
    ('5', 'S'),
    ('6', 'G'),
    ('8', 'B'),
    ('7', 'T'),
];

const MAPPED_COST: f64 = 1.0;
const UNMAPPED_COST: f64 = 2.0;
const CHANGE_COST: f64 = 0.5;

static PLATE_FORMATS: Lazy<Vec<(Regex, u32)>> = Lazy::new(|| {
    [
        (r"^[0-9][A-Z]{2}[0-9][A-Z]{2}$", 120),
        (r"^[A-Z]{3}[0-9]{3}$", 100),
        (r"^[A-Z]{2,4}[0-9]{2,4}$", 80),
        (r"^[A-Z0-9]{5,8}$", 40),
    ]
    .into_iter()
    .map(|(pattern, score)| {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("Failed to compile plate format {pattern}: {e}"));
        (regex, score)
    })
    .collect()
});

/// Best candidate found in a block of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub plate: String,
    pub score: u32,
}

/// Coerce `candidate` onto `template`, returning the rewritten text and its
/// cost.
///
/// A character that already fits its slot costs nothing. Otherwise it is
/// looked up in the slot's confusable map: a mapped character costs 1 plus
/// 0.5 for the change, an unmapped one costs 2 and is kept as is.
///
/// This departs from a flat costing where every position pays 1 (mapped or
/// fitting) or 2 (unmapped). Under the flat costing `O12ABC` ties at 10.5
/// and the digit-letter template wins the tie, so it still reads `0IZABC`.
pub fn coerce_to_template(candidate: &str, template: &[Slot]) -> (String, f64) {
    let mut cost = 0.0;
    let coerced: String = candidate
        .chars()
        .zip(template.iter().copied())
        .map(|(c, slot)| {
            if slot.accepts(c) {
                return c;
            }
            match slot.confusables().iter().find(|(from, _)| *from == c) {
                Some(&(_, to)) => {
                    cost += MAPPED_COST;
                    if to != c {
                        cost += CHANGE_COST;
                    }
                    to
                }
                None => {
                    cost += UNMAPPED_COST;
                    c
                }
            }
        })
        .collect();
    (coerced, cost)
}

/// Apply the cheapest template to a six-character candidate; other lengths
/// are returned unchanged.
pub fn coerce_candidate(candidate: &str) -> String {
    if candidate.chars().count() != 6 {
        return candidate.to_string();
    }

    let mut best: Option<(String, f64)> = None;
    for template in &TEMPLATES {
        let (coerced, cost) = coerce_to_template(candidate, template);
        if best.as_ref().map_or(true, |(_, best_cost)| cost < *best_cost) {
            best = Some((coerced, cost));
        }
    }
    best.map(|(coerced, _)| coerced)
        .unwrap_or_else(|| candidate.to_string())
}

/// Format score of an uppercase alphanumeric candidate; 0 when it resembles
/// no plate format.
pub fn score_candidate(candidate: &str) -> u32 {
    PLATE_FORMATS
        .iter()
        .find(|(regex, _)| regex.is_match(candidate))
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

/// Uppercase alphanumeric characters of a line
fn line_candidate(line: &str) -> String {
    line.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Highest scoring line of `full_text`, ties going to the longer line and
/// then to the earlier one. Lines whose candidate length falls outside
/// `[min_len, max_len]` are skipped, as are lines scoring 0.
pub fn best_pattern_line(full_text: &str, min_len: usize, max_len: usize) -> Option<PatternMatch> {
    let mut best: Option<PatternMatch> = None;

    for line in full_text.lines() {
        let candidate = line_candidate(line);
        if candidate.len() < min_len || candidate.len() > max_len {
            continue;
        }

        let plate = coerce_candidate(&candidate);
        let score = score_candidate(&plate);
        tracing::trace!(line, %plate, score, "scored text line");
        if score == 0 {
            continue;
        }

        let better = match &best {
            None => true,
            Some(b) => score > b.score || (score == b.score && plate.len() > b.plate.len()),
        };
        if better {
            best = Some(PatternMatch { plate, score });
        }
    }

    best
}
