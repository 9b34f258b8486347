//! Tunable thresholds for the plate engine.
//!
//! The zone ratios and tolerances are empirical constants, not derived
//! geometry. They are exposed through [`PlateEngineConfig`] so deployments
//! can tune them without touching control flow.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Object labels accepted as a vehicle (compared case-insensitively)
pub const VEHICLE_LABELS: [&str; 5] = ["VEHICLE", "CAR", "TRUCK", "VAN", "SUV"];

/// Plate zone left edge, as a fraction of the reference width
pub const ZONE_LEFT_RATIO: f64 = 0.18;
/// Plate zone top edge, as a fraction of the reference height
pub const ZONE_TOP_RATIO: f64 = 0.68;
/// Plate zone right edge, as a fraction of the reference width
pub const ZONE_RIGHT_RATIO: f64 = 0.82;
/// Plate zone bottom edge, as a fraction of the reference height
pub const ZONE_BOTTOM_RATIO: f64 = 0.98;

/// Line tolerance as a fraction of the plate zone height
pub const LINE_TOLERANCE_RATIO: f64 = 0.075;

/// Horizontal gap, relative to the mean token width, that inserts a dash
pub const GAP_SEPARATOR_RATIO: f64 = 0.35;

/// Minimum dash-stripped length of a single token
pub const MIN_TOKEN_LEN: usize = 2;

/// Dash-stripped length bounds of an assembled plate
pub const MIN_PLATE_LEN: usize = 4;
pub const MAX_PLATE_LEN: usize = 10;

/// Fixed score reported by the geometric strategy
pub const GEOMETRIC_SCORE: u32 = 200;

/// Length bounds of a whole-line candidate in the pattern strategy
pub const PATTERN_MIN_LEN: usize = 5;
pub const PATTERN_MAX_LEN: usize = 10;

/// Plate zone as fractions of the reference rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRatios {
    #[serde(default = "default_zone_left")]
    pub left: f64,
    #[serde(default = "default_zone_top")]
    pub top: f64,
    #[serde(default = "default_zone_right")]
    pub right: f64,
    #[serde(default = "default_zone_bottom")]
    pub bottom: f64,
}

fn default_zone_left() -> f64 {
    ZONE_LEFT_RATIO
}

fn default_zone_top() -> f64 {
    ZONE_TOP_RATIO
}

fn default_zone_right() -> f64 {
    ZONE_RIGHT_RATIO
}

fn default_zone_bottom() -> f64 {
    ZONE_BOTTOM_RATIO
}

impl Default for ZoneRatios {
    fn default() -> Self {
        Self {
            left: ZONE_LEFT_RATIO,
            top: ZONE_TOP_RATIO,
            right: ZONE_RIGHT_RATIO,
            bottom: ZONE_BOTTOM_RATIO,
        }
    }
}

/// How tokens are grouped into text lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineGrouping {
    /// One pass over tokens sorted by height; a band, once closed, never
    /// accepts another token
    #[default]
    Greedy,
    /// Greedy pass followed by merging neighbouring bands whose token
    /// centers lie within the tolerance
    MergeBands,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateEngineConfig {
    /// Plate zone ratios relative to the vehicle box (or the whole frame)
    #[serde(default)]
    pub zone: ZoneRatios,

    /// Object labels treated as vehicles
    #[serde(default = "default_vehicle_labels")]
    pub vehicle_labels: Vec<String>,

    /// Line tolerance as a fraction of the zone height
    #[serde(default = "default_line_tolerance_ratio")]
    pub line_tolerance_ratio: f64,

    /// Line grouping policy
    #[serde(default)]
    pub line_grouping: LineGrouping,

    /// Gap (fraction of mean token width) that inserts a separator
    #[serde(default = "default_gap_separator_ratio")]
    pub gap_separator_ratio: f64,

    /// Minimum dash-stripped token length
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,

    /// Minimum dash-stripped plate length (geometric strategy)
    #[serde(default = "default_min_plate_len")]
    pub min_plate_len: usize,

    /// Maximum dash-stripped plate length (geometric strategy)
    #[serde(default = "default_max_plate_len")]
    pub max_plate_len: usize,

    /// Score reported for a geometric match
    #[serde(default = "default_geometric_score")]
    pub geometric_score: u32,

    /// Minimum candidate length (pattern strategy)
    #[serde(default = "default_pattern_min_len")]
    pub pattern_min_len: usize,

    /// Maximum candidate length (pattern strategy)
    #[serde(default = "default_pattern_max_len")]
    pub pattern_max_len: usize,

    /// In auto mode, run the pattern strategy when geometry finds nothing
    #[serde(default)]
    pub fallback_to_pattern: bool,
}

fn default_vehicle_labels() -> Vec<String> {
    VEHICLE_LABELS.iter().map(|s| s.to_string()).collect()
}

fn default_line_tolerance_ratio() -> f64 {
    LINE_TOLERANCE_RATIO
}

fn default_gap_separator_ratio() -> f64 {
    GAP_SEPARATOR_RATIO
}

fn default_min_token_len() -> usize {
    MIN_TOKEN_LEN
}

fn default_min_plate_len() -> usize {
    MIN_PLATE_LEN
}

fn default_max_plate_len() -> usize {
    MAX_PLATE_LEN
}

fn default_geometric_score() -> u32 {
    GEOMETRIC_SCORE
}

fn default_pattern_min_len() -> usize {
    PATTERN_MIN_LEN
}

fn default_pattern_max_len() -> usize {
    PATTERN_MAX_LEN
}

impl Default for PlateEngineConfig {
    fn default() -> Self {
        Self {
            zone: ZoneRatios::default(),
            vehicle_labels: default_vehicle_labels(),
            line_tolerance_ratio: default_line_tolerance_ratio(),
            line_grouping: LineGrouping::default(),
            gap_separator_ratio: default_gap_separator_ratio(),
            min_token_len: default_min_token_len(),
            min_plate_len: default_min_plate_len(),
            max_plate_len: default_max_plate_len(),
            geometric_score: default_geometric_score(),
            pattern_min_len: default_pattern_min_len(),
            pattern_max_len: default_pattern_max_len(),
            fallback_to_pattern: false,
        }
    }
}

impl PlateEngineConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid engine config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let z = &self.zone;
        for (name, value) in [
            ("zone.left", z.left),
            ("zone.top", z.top),
            ("zone.right", z.right),
            ("zone.bottom", z.bottom),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
        }
        if z.left >= z.right || z.top >= z.bottom {
            bail!("plate zone ratios must describe a non-empty rectangle");
        }
        if !self.line_tolerance_ratio.is_finite() || self.line_tolerance_ratio < 0.0 {
            bail!("line_tolerance_ratio must be a non-negative number");
        }
        if !self.gap_separator_ratio.is_finite() || self.gap_separator_ratio < 0.0 {
            bail!("gap_separator_ratio must be a non-negative number");
        }
        if self.min_plate_len > self.max_plate_len {
            bail!(
                "min_plate_len ({}) exceeds max_plate_len ({})",
                self.min_plate_len,
                self.max_plate_len
            );
        }
        if self.pattern_min_len > self.pattern_max_len {
            bail!(
                "pattern_min_len ({}) exceeds pattern_max_len ({})",
                self.pattern_min_len,
                self.pattern_max_len
            );
        }
        if self.geometric_score == 0 {
            bail!("geometric_score must be positive, 0 is reserved for no detection");
        }
        Ok(())
    }

    pub fn is_vehicle_label(&self, label: &str) -> bool {
        self.vehicle_labels
            .iter()
            .any(|known| known.eq_ignore_ascii_case(label))
    }
}
