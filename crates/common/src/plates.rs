//! License plate recognition contracts.
//!
//! These types carry annotation payloads from an image-annotation provider
//! into the plate engine and carry the recognized plate back out. Word
//! annotations use absolute pixel vertices; object annotations use vertices
//! normalized to `[0, 1]`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel dimensions of the annotated image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}

impl ImageDescriptor {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// Negative dimensions are caller bugs; zero is a valid (empty) image.
    pub fn is_valid(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// The whole frame as a box
    pub fn full_box(&self) -> PixelBox {
        PixelBox::new(0, 0, self.width, self.height)
    }
}

/// Axis-aligned box in pixel space, `x2 >= x1` and `y2 >= y1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl PixelBox {
    /// Build a box from two corners in any order
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> i64 {
        self.x2.saturating_sub(self.x1).max(0)
    }

    pub fn height(&self) -> i64 {
        self.y2.saturating_sub(self.y1).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() == 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 as f64 + self.x2 as f64) / 2.0,
            (self.y1 as f64 + self.y2 as f64) / 2.0,
        )
    }

    /// Inclusive on every edge
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x1 as f64 && x <= self.x2 as f64 && y >= self.y1 as f64 && y <= self.y2 as f64
    }
}

/// Absolute pixel vertex. A missing or non-numeric coordinate is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub x: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub y: Option<i64>,
}

impl Vertex {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }
}

/// Vertex normalized to the image size
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVertex {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
}

impl NormalizedVertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }
}

/// One word (or, at index 0, the full text block) from text detection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWordAnnotation {
    #[serde(default, alias = "description")]
    pub text: String,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

impl RawWordAnnotation {
    pub fn new(text: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        Self {
            text: text.into(),
            vertices,
        }
    }

    /// Word annotation covering the given box corners
    pub fn with_box(text: impl Into<String>, x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self::new(
            text,
            vec![
                Vertex::new(x1, y1),
                Vertex::new(x2, y1),
                Vertex::new(x2, y2),
                Vertex::new(x1, y2),
            ],
        )
    }
}

/// One localized object from object detection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObjectAnnotation {
    #[serde(default, alias = "name")]
    pub label: String,
    #[serde(default, alias = "normalizedVertices")]
    pub normalized_vertices: Vec<NormalizedVertex>,
}

impl RawObjectAnnotation {
    pub fn new(label: impl Into<String>, normalized_vertices: Vec<NormalizedVertex>) -> Self {
        Self {
            label: label.into(),
            normalized_vertices,
        }
    }

    /// Object annotation covering the given normalized corners
    pub fn with_box(label: impl Into<String>, fx1: f64, fy1: f64, fx2: f64, fy2: f64) -> Self {
        Self::new(
            label,
            vec![
                NormalizedVertex::new(fx1, fy1),
                NormalizedVertex::new(fx2, fy1),
                NormalizedVertex::new(fx2, fy2),
                NormalizedVertex::new(fx1, fy2),
            ],
        )
    }
}

/// Everything an annotation provider returned for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotations {
    /// Word annotations; index 0 holds the full recognized text block
    #[serde(default, alias = "word_annotations")]
    pub words: Vec<RawWordAnnotation>,

    #[serde(default, alias = "object_annotations")]
    pub objects: Vec<RawObjectAnnotation>,

    /// Line-delimited OCR text, overrides the index-0 block when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

impl ImageAnnotations {
    pub fn new(words: Vec<RawWordAnnotation>, objects: Vec<RawObjectAnnotation>) -> Self {
        Self {
            words,
            objects,
            full_text: None,
        }
    }

    /// Text-only payload, as produced by providers without geometry
    pub fn from_text(full_text: impl Into<String>) -> Self {
        Self {
            words: Vec::new(),
            objects: Vec::new(),
            full_text: Some(full_text.into()),
        }
    }

    /// Full recognized text
    pub fn full_text(&self) -> &str {
        match &self.full_text {
            Some(text) => text,
            None => self.words.first().map(|w| w.text.as_str()).unwrap_or(""),
        }
    }

    /// Word annotations usable as token candidates (index 0 excluded)
    pub fn word_candidates(&self) -> &[RawWordAnnotation] {
        self.words.get(1..).unwrap_or(&[])
    }

    pub fn has_word_geometry(&self) -> bool {
        !self.word_candidates().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.objects.is_empty() && self.full_text().trim().is_empty()
    }
}

/// Recognition strategy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    /// Geometric when word boxes exist, pattern scoring otherwise
    #[default]
    Auto,
    /// Vehicle box, plate zone and line assembly from word boxes
    Geometric,
    /// Template coercion and format scoring over the full text
    Pattern,
}

impl RecognitionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Geometric => "geometric",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecognitionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "geometric" | "geometry" => Ok(Self::Geometric),
            "pattern" | "text" => Ok(Self::Pattern),
            other => Err(format!("unknown recognition mode '{}'", other)),
        }
    }
}

/// Observability data for a recognition call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionDiagnostics {
    /// Full text block as returned by the provider
    pub raw_text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_box: Option<PixelBox>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_zone: Option<PixelBox>,

    /// Strategy that produced the final answer
    pub strategy: RecognitionMode,
}

/// Best-guess plate. An empty plate with score 0 means "no plate found".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub plate: String,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<RecognitionDiagnostics>,
}

impl RecognitionResult {
    pub fn new(plate: impl Into<String>, score: u32) -> Self {
        Self {
            plate: plate.into(),
            score,
            diagnostics: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_diagnostics(mut self, diagnostics: RecognitionDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn is_detected(&self) -> bool {
        !self.plate.is_empty()
    }
}

/// Request body for recognizing a plate from an annotation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlateRecognizeRequest {
    #[serde(default)]
    pub image: ImageDescriptor,

    #[serde(flatten)]
    pub annotations: ImageAnnotations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RecognitionMode>,
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(json_number).and_then(|n| {
        // Truncate toward zero like an integer cast
        if n.is_finite() && n.abs() < i64::MAX as f64 {
            Some(n.trunc() as i64)
        } else {
            None
        }
    }))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(json_number).filter(|n| n.is_finite()))
}

fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_box_orders_corners() {
        let b = PixelBox::new(50, 40, 10, 20);
        assert_eq!(b, PixelBox { x1: 10, y1: 20, x2: 50, y2: 40 });
        assert_eq!(b.area(), 800);
        assert_eq!(b.center(), (30.0, 30.0));
    }

    #[test]
    fn test_pixel_box_containment_is_inclusive() {
        let zone = PixelBox::new(36, 68, 164, 98);
        assert!(zone.contains_point(36.0, 68.0));
        assert!(zone.contains_point(164.0, 98.0));
        assert!(!zone.contains_point(164.5, 80.0));
    }

    #[test]
    fn test_zero_area_box_is_degenerate() {
        assert!(PixelBox::new(5, 5, 5, 40).is_degenerate());
        assert!(!PixelBox::new(5, 5, 6, 6).is_degenerate());
    }

    #[test]
    fn test_extreme_corners_saturate() {
        let wide = PixelBox::new(i64::MIN, 0, i64::MAX, 10);
        assert_eq!(wide.width(), i64::MAX);
        assert_eq!(wide.area(), i64::MAX);
    }

    #[test]
    fn test_vertex_tolerates_malformed_coordinates() {
        let vertices: Vec<Vertex> = serde_json::from_value(serde_json::json!([
            {"x": 10, "y": 20},
            {"x": "12", "y": 7.9},
            {"x": "abc", "y": 3},
            {"y": 4},
            {"x": null, "y": null}
        ]))
        .unwrap();

        assert_eq!(vertices[0], Vertex::new(10, 20));
        assert_eq!(vertices[1], Vertex::new(12, 7));
        assert_eq!(vertices[2].x, None);
        assert_eq!(vertices[3].x, None);
        assert_eq!(vertices[4], Vertex::default());
    }

    #[test]
    fn test_object_annotation_accepts_provider_field_names() {
        let object: RawObjectAnnotation = serde_json::from_value(serde_json::json!({
            "name": "Car",
            "normalizedVertices": [{"x": 0.1, "y": 0.2}, {"x": 0.9, "y": 0.8}]
        }))
        .unwrap();

        assert_eq!(object.label, "Car");
        assert_eq!(object.normalized_vertices.len(), 2);
        assert_eq!(object.normalized_vertices[1].x, Some(0.9));
    }

    #[test]
    fn test_full_text_prefers_explicit_text() {
        let mut annotations = ImageAnnotations::new(
            vec![RawWordAnnotation::new("ABC 123\nGARAGE", vec![])],
            vec![],
        );
        assert_eq!(annotations.full_text(), "ABC 123\nGARAGE");
        assert!(!annotations.has_word_geometry());

        annotations.full_text = Some("XYZ".to_string());
        assert_eq!(annotations.full_text(), "XYZ");
    }

    #[test]
    fn test_word_candidates_skip_full_text_block() {
        let annotations = ImageAnnotations::new(
            vec![
                RawWordAnnotation::new("AB 12", vec![]),
                RawWordAnnotation::with_box("AB", 0, 0, 10, 10),
                RawWordAnnotation::with_box("12", 12, 0, 22, 10),
            ],
            vec![],
        );
        let candidates = annotations.word_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "AB");
        assert!(ImageAnnotations::default().word_candidates().is_empty());
    }

    #[test]
    fn test_recognition_mode_parsing() {
        assert_eq!("Geometric".parse::<RecognitionMode>(), Ok(RecognitionMode::Geometric));
        assert_eq!("pattern".parse::<RecognitionMode>(), Ok(RecognitionMode::Pattern));
        assert_eq!("".parse::<RecognitionMode>(), Ok(RecognitionMode::Auto));
        assert!("fuzzy".parse::<RecognitionMode>().is_err());
    }

    #[test]
    fn test_recognize_request_flattens_annotations() {
        let request: PlateRecognizeRequest = serde_json::from_value(serde_json::json!({
            "image": {"width": 200, "height": 100},
            "words": [{"text": "AB12"}],
            "objects": [],
            "mode": "pattern"
        }))
        .unwrap();

        assert_eq!(request.image, ImageDescriptor::new(200, 100));
        assert_eq!(request.annotations.words.len(), 1);
        assert_eq!(request.mode, Some(RecognitionMode::Pattern));
    }

    #[test]
    fn test_empty_result_is_not_detected() {
        let result = RecognitionResult::empty();
        assert!(!result.is_detected());
        assert_eq!(result.score, 0);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("diagnostics").is_none());
    }
}
