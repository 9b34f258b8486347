use super::error::ApiError;
use crate::error::RecognitionError;
use crate::state::ServiceState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use common::ai_tasks::{AiResult, PluginInfo, PluginListResponse, VideoFrame};
use common::plates::{PixelBox, PlateRecognizeRequest, RecognitionMode, RecognitionResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Plate answer with the debugging fields clients rely on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResponse {
    pub plate: String,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RecognitionMode>,
    #[serde(default)]
    pub debug_raw_text: String,
    #[serde(default)]
    pub debug_vehicle_box: Option<PixelBox>,
    #[serde(default)]
    pub debug_plate_zone: Option<PixelBox>,
}

impl From<RecognitionResult> for PlateResponse {
    fn from(result: RecognitionResult) -> Self {
        let diagnostics = result.diagnostics.unwrap_or_default();
        Self {
            plate: result.plate,
            score: result.score,
            strategy: Some(diagnostics.strategy),
            debug_raw_text: diagnostics.raw_text,
            debug_vehicle_box: diagnostics.vehicle_box,
            debug_plate_zone: diagnostics.plate_zone,
        }
    }
}

/// Recognize a plate from annotations supplied in the request
pub async fn recognize_plate(
    State(state): State<ServiceState>,
    Json(request): Json<PlateRecognizeRequest>,
) -> Json<PlateResponse> {
    Json(state.recognize(&request).into())
}

/// Read a plate from an encoded image
pub async fn read_plate(
    State(state): State<ServiceState>,
    Json(frame): Json<VideoFrame>,
) -> Result<Json<PlateResponse>, ApiError> {
    let result = state.read_plate(&frame).await.map_err(|e| {
        tracing::warn!(source = %frame.source_id, error = %e, "Plate read failed");
        ApiError::from(e)
    })?;
    Ok(Json(result.into()))
}

/// List all available plugins
pub async fn list_plugins(State(state): State<ServiceState>) -> Json<PluginListResponse> {
    let plugins = state.plugins().list().await;
    Json(PluginListResponse { plugins })
}

/// Get information about a specific plugin
pub async fn get_plugin(
    State(state): State<ServiceState>,
    Path(plugin_id): Path<String>,
) -> Result<Json<PluginInfo>, ApiError> {
    let plugin = state
        .plugins()
        .get(&plugin_id)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    let info = plugin.read().await.info();
    Ok(Json(info))
}

/// Submit a frame to a specific plugin
pub async fn submit_frame(
    State(state): State<ServiceState>,
    Path(plugin_id): Path<String>,
    Json(frame): Json<VideoFrame>,
) -> Result<Json<AiResult>, ApiError> {
    if !state.plugins().has_plugin(&plugin_id).await {
        return Err(ApiError::not_found(format!("Plugin '{}' not found", plugin_id)));
    }

    match state.process_frame(&plugin_id, frame).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!(plugin = %plugin_id, error = %e, "Failed to process frame");
            match e.downcast::<RecognitionError>() {
                Ok(recognition) => Err(recognition.into()),
                Err(other) => Err(ApiError::bad_request(format!(
                    "Failed to process frame: {}",
                    other
                ))),
            }
        }
    }
}

/// Health check endpoint
pub async fn healthz(State(state): State<ServiceState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "ocr-service",
            "node_id": state.node_id(),
            "version": common::VERSION,
        })),
    )
}

/// Readiness check endpoint
pub async fn readyz(State(state): State<ServiceState>) -> impl IntoResponse {
    let plugin_health = state.plugins().health_check_all().await;
    let all_healthy = plugin_health.values().all(|&h| h);

    let (status, label) = if all_healthy {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "plugins": plugin_health
        })),
    )
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics() -> impl IntoResponse {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = telemetry::metrics::REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s.into_response(),
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to convert metrics").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::plates::RecognitionDiagnostics;

    #[test]
    fn test_plate_response_carries_debug_fields() {
        let result = RecognitionResult::new("AB12", 200).with_diagnostics(RecognitionDiagnostics {
            raw_text: "AB 12".to_string(),
            vehicle_box: Some(PixelBox::new(0, 0, 200, 100)),
            plate_zone: Some(PixelBox::new(36, 68, 164, 98)),
            strategy: RecognitionMode::Geometric,
        });

        let value = serde_json::to_value(PlateResponse::from(result)).unwrap();
        assert_eq!(value["plate"], "AB12");
        assert_eq!(value["score"], 200);
        assert_eq!(value["strategy"], "geometric");
        assert_eq!(value["debug_raw_text"], "AB 12");
        assert_eq!(value["debug_plate_zone"]["x1"], 36);
        assert_eq!(value["debug_vehicle_box"]["x2"], 200);
    }

    #[test]
    fn test_empty_result_serializes_null_boxes() {
        let value = serde_json::to_value(PlateResponse::from(RecognitionResult::empty())).unwrap();
        assert_eq!(value["plate"], "");
        assert_eq!(value["score"], 0);
        assert!(value["debug_vehicle_box"].is_null());
    }
}
