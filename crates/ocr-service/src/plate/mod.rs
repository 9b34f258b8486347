//! License plate engine.
//!
//! Turns annotation payloads into a single best-guess plate. Two strategies
//! share one result contract:
//!
//! - geometric: vehicle box, plate zone, tokens, line clustering, best line
//!   and left-to-right assembly over word boxes
//! - pattern: template coercion and format scoring over plain text lines
//!
//! The engine holds only its configuration. Every call is independent and
//! performs no I/O, so one engine can be shared across tasks freely.

pub mod assemble;
pub mod config;
pub mod finalize;
pub mod geometry;
pub mod lines;
pub mod pattern;
pub mod tokens;
pub mod vehicle;
pub mod zone;

pub use config::{LineGrouping, PlateEngineConfig, ZoneRatios};

use common::plates::{
    ImageAnnotations, ImageDescriptor, RawObjectAnnotation, RawWordAnnotation,
    RecognitionDiagnostics, RecognitionMode, RecognitionResult,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PlateEngine {
    config: PlateEngineConfig,
}

impl PlateEngine {
    pub fn new(config: PlateEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlateEngineConfig {
        &self.config
    }

    /// Locate the plate from word boxes and optional vehicle boxes.
    ///
    /// `words[0]` is the provider's full text block; it is reported in the
    /// diagnostics and never used as a token.
    pub fn recognize_geometric(
        &self,
        words: &[RawWordAnnotation],
        objects: &[RawObjectAnnotation],
        image: ImageDescriptor,
    ) -> RecognitionResult {
        let mut diagnostics = RecognitionDiagnostics {
            raw_text: words.first().map(|w| w.text.clone()).unwrap_or_default(),
            strategy: RecognitionMode::Geometric,
            ..Default::default()
        };

        if !image.is_valid() {
            debug!(width = image.width, height = image.height, "negative image size");
            return RecognitionResult::empty().with_diagnostics(diagnostics);
        }

        let cfg = &self.config;
        let vehicle_box = vehicle::detect_vehicle_box(objects, image, cfg);
        let plate_zone = zone::estimate_plate_zone(vehicle_box, image, &cfg.zone);
        diagnostics.vehicle_box = vehicle_box;
        diagnostics.plate_zone = Some(plate_zone);

        let candidates = words.get(1..).unwrap_or(&[]);
        let tokens = tokens::build_tokens(candidates, plate_zone, cfg.min_token_len);
        debug!(
            words = candidates.len(),
            tokens = tokens.len(),
            vehicle = vehicle_box.is_some(),
            "plate zone tokens"
        );

        let tolerance = lines::line_tolerance(plate_zone, cfg.line_tolerance_ratio);
        let clusters = lines::cluster_lines(tokens, tolerance, cfg.line_grouping);
        let line_count = clusters.len();

        let candidate = lines::select_best_line(clusters)
            .map(|line| assemble::assemble_line(&line, cfg.gap_separator_ratio))
            .unwrap_or_default();

        let (plate, score) = finalize::finalize(
            &candidate,
            cfg.min_plate_len,
            cfg.max_plate_len,
            cfg.geometric_score,
        );
        debug!(lines = line_count, %candidate, %plate, "geometric recognition done");

        RecognitionResult::new(plate, score).with_diagnostics(diagnostics)
    }

    /// Pick the most plate-like line of plain OCR text.
    pub fn recognize_pattern(&self, full_text: &str) -> RecognitionResult {
        let cfg = &self.config;
        let diagnostics = RecognitionDiagnostics {
            raw_text: full_text.to_string(),
            strategy: RecognitionMode::Pattern,
            ..Default::default()
        };

        let (plate, score) = match pattern::best_pattern_line(
            full_text,
            cfg.pattern_min_len,
            cfg.pattern_max_len,
        ) {
            Some(best) => finalize::finalize(
                &best.plate,
                cfg.pattern_min_len,
                cfg.pattern_max_len,
                best.score,
            ),
            None => (String::new(), 0),
        };
        debug!(%plate, score, "pattern recognition done");

        RecognitionResult::new(plate, score).with_diagnostics(diagnostics)
    }

    /// Run the strategy selected by `mode`.
    ///
    /// `Auto` uses geometry whenever word boxes beyond the full text block
    /// exist and falls back to text patterns otherwise. With
    /// `fallback_to_pattern` set, an empty geometric result is retried on the
    /// full text as well.
    pub fn recognize(
        &self,
        annotations: &ImageAnnotations,
        image: ImageDescriptor,
        mode: RecognitionMode,
    ) -> RecognitionResult {
        match mode {
            RecognitionMode::Geometric => {
                self.recognize_geometric(&annotations.words, &annotations.objects, image)
            }
            RecognitionMode::Pattern => self.recognize_pattern(annotations.full_text()),
            RecognitionMode::Auto if !annotations.has_word_geometry() => {
                self.recognize_pattern(annotations.full_text())
            }
            RecognitionMode::Auto => {
                let geometric =
                    self.recognize_geometric(&annotations.words, &annotations.objects, image);
                if geometric.is_detected() || !self.config.fallback_to_pattern {
                    return geometric;
                }

                debug!("geometric recognition empty, falling back to text patterns");
                let mut fallback = self.recognize_pattern(annotations.full_text());
                // Keep the geometric boxes for debugging
                if let (Some(fb), Some(geo)) =
                    (fallback.diagnostics.as_mut(), geometric.diagnostics)
                {
                    fb.vehicle_box = geo.vehicle_box;
                    fb.plate_zone = geo.plate_zone;
                }
                fallback
            }
        }
    }
}
