//! Plate reader plugin.
//!
//! Decodes a frame, asks the annotation provider for text and vehicle boxes,
//! and runs the plate engine on the answer. The plugin is the only place where
//! the engine meets I/O.

use super::AiPlugin;
use crate::error::RecognitionError;
use crate::plate::{PlateEngine, PlateEngineConfig};
use crate::provider::AnnotationProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use common::ai_tasks::{AiResult, BoundingBox, Detection, VideoFrame};
use common::plates::{ImageDescriptor, PixelBox, RecognitionMode, RecognitionResult};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const PLUGIN_ID: &str = "plate_reader";

/// Detection class reported for a recognized plate
pub const PLATE_CLASS: &str = "license_plate";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateReaderConfig {
    /// Engine thresholds
    #[serde(default)]
    pub engine: PlateEngineConfig,

    /// Strategy used for every frame
    #[serde(default)]
    pub mode: RecognitionMode,
}

#[derive(Default)]
pub struct PlateReaderPlugin {
    config: PlateReaderConfig,
    engine: PlateEngine,
    provider: Option<Arc<dyn AnnotationProvider>>,
}

impl PlateReaderPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: Arc<dyn AnnotationProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    pub fn set_provider(&mut self, provider: Arc<dyn AnnotationProvider>) {
        self.provider = Some(provider);
    }

    pub fn config(&self) -> &PlateReaderConfig {
        &self.config
    }

    pub fn engine(&self) -> &PlateEngine {
        &self.engine
    }

    /// Recognize the plate in one frame.
    ///
    /// Frame dimensions are taken from the frame itself, then from the
    /// encoded image header, and default to 0x0 when neither is known.
    pub async fn read_frame(&self, frame: &VideoFrame) -> Result<RecognitionResult, RecognitionError> {
        let start = Instant::now();
        let mode = self.config.mode;

        let outcome = self.annotate_and_recognize(frame, mode).await;
        match &outcome {
            Ok(result) => record_recognition(result, start.elapsed()),
            Err(err) => record_failure(mode, err),
        }
        outcome
    }

    async fn annotate_and_recognize(
        &self,
        frame: &VideoFrame,
        mode: RecognitionMode,
    ) -> Result<RecognitionResult, RecognitionError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            RecognitionError::PluginNotReady("no annotation provider configured".to_string())
        })?;

        let bytes = base64::prelude::BASE64_STANDARD
            .decode(frame.data.trim())
            .map_err(|e| RecognitionError::invalid_image(format!("invalid base64 data: {}", e)))?;
        if bytes.is_empty() {
            return Err(RecognitionError::invalid_image("empty image data"));
        }

        let image = frame_dimensions(frame, &bytes);
        let annotations = provider.annotate(&bytes).await?;

        let result = self.engine.recognize(&annotations, image, mode);
        debug!(
            source = %frame.source_id,
            width = image.width,
            height = image.height,
            plate = %result.plate,
            score = result.score,
            "frame recognized"
        );
        Ok(result)
    }
}

/// Dimensions stated by the frame, else read from the image header
pub fn frame_dimensions(frame: &VideoFrame, bytes: &[u8]) -> ImageDescriptor {
    if frame.width > 0 && frame.height > 0 {
        return ImageDescriptor::new(frame.width.into(), frame.height.into());
    }

    let dimensions = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.into_dimensions());

    match dimensions {
        Ok((width, height)) => ImageDescriptor::new(width.into(), height.into()),
        Err(e) => {
            debug!(error = %e, "image size unknown");
            ImageDescriptor::default()
        }
    }
}

/// Count a finished recognition and its latency
pub fn record_recognition(result: &RecognitionResult, elapsed: Duration) {
    let mode = result
        .diagnostics
        .as_ref()
        .map(|d| d.strategy)
        .unwrap_or_default();
    let outcome = if result.is_detected() { "detected" } else { "empty" };

    telemetry::metrics::PLATE_RECOGNITIONS
        .with_label_values(&[mode.as_str(), outcome])
        .inc();
    telemetry::metrics::PLATE_RECOGNITION_LATENCY
        .with_label_values(&[mode.as_str()])
        .observe(elapsed.as_secs_f64());
}

fn record_failure(mode: RecognitionMode, err: &RecognitionError) {
    let outcome = match err {
        RecognitionError::Unavailable { .. } => "unavailable",
        RecognitionError::InvalidImage(_) => "invalid_image",
        RecognitionError::PluginNotReady(_) => "not_ready",
    };
    telemetry::metrics::PLATE_RECOGNITIONS
        .with_label_values(&[mode.as_str(), outcome])
        .inc();
}

fn to_bounding_box(zone: PixelBox) -> BoundingBox {
    let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
    BoundingBox {
        x: clamp(zone.x1),
        y: clamp(zone.y1),
        width: clamp(zone.width()),
        height: clamp(zone.height()),
    }
}

/// Detection for a recognized plate; `None` when nothing was found
pub fn plate_detection(result: &RecognitionResult, full_score: u32) -> Option<Detection> {
    if !result.is_detected() {
        return None;
    }
    let diagnostics = result.diagnostics.as_ref();
    let zone = diagnostics.and_then(|d| d.plate_zone).unwrap_or_default();

    Some(Detection {
        class: PLATE_CLASS.to_string(),
        confidence: (result.score as f32 / full_score.max(1) as f32).min(1.0),
        bbox: to_bounding_box(zone),
        metadata: Some(serde_json::json!({
            "plate_number": result.plate,
            "score": result.score,
            "strategy": diagnostics.map(|d| d.strategy.as_str()),
        })),
    })
}

#[async_trait]
impl AiPlugin for PlateReaderPlugin {
    fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn name(&self) -> &'static str {
        "License Plate Reader"
    }

    fn description(&self) -> &'static str {
        "Locates and reads license plates from image annotation text and vehicle boxes"
    }

    fn config_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "mode": {
                    "type": "string",
                    "enum": ["auto", "geometric", "pattern"],
                    "default": "auto",
                    "description": "Recognition strategy"
                },
                "engine": {
                    "type": "object",
                    "properties": {
                        "zone": {
                            "type": "object",
                            "description": "Plate zone as fractions of the vehicle box",
                            "properties": {
                                "left": {"type": "number", "default": 0.18},
                                "top": {"type": "number", "default": 0.68},
                                "right": {"type": "number", "default": 0.82},
                                "bottom": {"type": "number", "default": 0.98}
                            }
                        },
                        "vehicle_labels": {
                            "type": "array",
                            "items": {"type": "string"},
                            "default": ["VEHICLE", "CAR", "TRUCK", "VAN", "SUV"]
                        },
                        "line_tolerance_ratio": {"type": "number", "minimum": 0.0, "default": 0.075},
                        "line_grouping": {
                            "type": "string",
                            "enum": ["greedy", "merge_bands"],
                            "default": "greedy"
                        },
                        "gap_separator_ratio": {"type": "number", "minimum": 0.0, "default": 0.35},
                        "min_token_len": {"type": "integer", "minimum": 1, "default": 2},
                        "min_plate_len": {"type": "integer", "default": 4},
                        "max_plate_len": {"type": "integer", "default": 10},
                        "geometric_score": {"type": "integer", "minimum": 1, "default": 200},
                        "pattern_min_len": {"type": "integer", "default": 5},
                        "pattern_max_len": {"type": "integer", "default": 10},
                        "fallback_to_pattern": {"type": "boolean", "default": false}
                    }
                }
            }
        }))
    }

    fn supported_formats(&self) -> Vec<String> {
        vec![
            "jpeg".to_string(),
            "png".to_string(),
            "gif".to_string(),
            "webp".to_string(),
        ]
    }

    fn annotation_provider(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    fn as_plate_reader(&self) -> Option<&PlateReaderPlugin> {
        Some(self)
    }

    async fn init(&mut self, config: serde_json::Value) -> Result<()> {
        if !config.is_null() {
            self.config =
                serde_json::from_value(config).context("Invalid plate reader configuration")?;
        }
        self.config.engine.validate()?;
        self.engine = PlateEngine::new(self.config.engine.clone());

        info!(
            mode = %self.config.mode,
            line_grouping = ?self.config.engine.line_grouping,
            provider = self.annotation_provider().unwrap_or("none"),
            "Initialized plate reader"
        );
        if self.provider.is_none() {
            warn!("Plate reader has no annotation provider, frames will be rejected");
        }
        Ok(())
    }

    async fn process_frame(&self, frame: &VideoFrame) -> Result<AiResult> {
        let start = Instant::now();
        let result = self.read_frame(frame).await?;

        let detections: Vec<Detection> =
            plate_detection(&result, self.config.engine.geometric_score)
                .into_iter()
                .collect();
        let confidence = detections.first().map(|d| d.confidence);
        let diagnostics = result.diagnostics.unwrap_or_default();

        Ok(AiResult {
            task_id: frame.source_id.clone(),
            timestamp: frame.timestamp,
            plugin_type: self.id().to_string(),
            detections,
            confidence,
            processing_time_ms: Some(start.elapsed().as_millis() as u64),
            metadata: Some(serde_json::json!({
                "frame_sequence": frame.sequence,
                "plate": result.plate,
                "score": result.score,
                "raw_text": diagnostics.raw_text,
                "vehicle_box": diagnostics.vehicle_box,
                "plate_zone": diagnostics.plate_zone,
            })),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.provider.is_some())
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down plate reader plugin");
        self.provider = None;
        Ok(())
    }
}
