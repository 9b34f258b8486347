//! Plugin contracts for the OCR service.
//!
//! Frames travel as base64 JSON payloads, plugins answer with an [`AiResult`]
//! holding zero or more [`Detection`]s.

use serde::{Deserialize, Serialize};

/// Image frame submitted to a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFrame {
    /// Source camera, upload or request ID
    pub source_id: String,

    /// Capture timestamp (Unix timestamp in milliseconds)
    #[serde(default)]
    pub timestamp: u64,

    /// Frame sequence number
    #[serde(default)]
    pub sequence: u64,

    /// Frame width in pixels (0 when unknown)
    #[serde(default)]
    pub width: u32,

    /// Frame height in pixels (0 when unknown)
    #[serde(default)]
    pub height: u32,

    /// Image format (e.g., "jpeg", "png")
    #[serde(default = "default_format")]
    pub format: String,

    /// Encoded image bytes, base64 for JSON transport
    pub data: String,
}

fn default_format() -> String {
    "jpeg".to_string()
}

/// Detection result from a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Object class/label
    pub class: String,

    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,

    /// Bounding box (x, y, width, height)
    pub bbox: BoundingBox,

    /// Additional metadata (plugin-specific)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Bounding box coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Plugin processing result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResult {
    /// Source ID of the processed frame
    pub task_id: String,

    /// Frame timestamp
    pub timestamp: u64,

    /// Plugin type that produced the result
    pub plugin_type: String,

    /// Detected objects/entities
    pub detections: Vec<Detection>,

    /// Overall confidence score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    /// Processing latency in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Plugin metadata and capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin unique identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Plugin description
    pub description: String,

    /// Plugin version
    pub version: String,

    /// Configuration schema (JSON Schema)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<serde_json::Value>,

    /// Supported input formats
    pub supported_formats: Vec<String>,

    /// Annotation provider backing the plugin, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_provider: Option<String>,
}

/// List of available plugins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginListResponse {
    pub plugins: Vec<PluginInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_frame_defaults() {
        let frame: VideoFrame = serde_json::from_value(serde_json::json!({
            "source_id": "upload-1",
            "data": "aGVsbG8="
        }))
        .unwrap();

        assert_eq!(frame.width, 0);
        assert_eq!(frame.height, 0);
        assert_eq!(frame.format, "jpeg");
        assert_eq!(frame.sequence, 0);
    }

    #[test]
    fn test_detection_serialization() {
        let detection = Detection {
            class: "license_plate".to_string(),
            confidence: 1.0,
            bbox: BoundingBox {
                x: 36,
                y: 68,
                width: 128,
                height: 30,
            },
            metadata: Some(serde_json::json!({
                "plate_number": "AB12",
            })),
        };

        let json = serde_json::to_string(&detection).unwrap();
        let deserialized: Detection = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.class, detection.class);
        assert_eq!(deserialized.bbox, detection.bbox);
    }

    #[test]
    fn test_ai_result_skips_empty_optionals() {
        let result = AiResult {
            task_id: "upload-1".to_string(),
            timestamp: 0,
            plugin_type: "plate_reader".to_string(),
            detections: vec![],
            confidence: None,
            processing_time_ms: None,
            metadata: None,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("confidence").is_none());
        assert!(value.get("metadata").is_none());
        assert_eq!(value["detections"], serde_json::json!([]));
    }
}
