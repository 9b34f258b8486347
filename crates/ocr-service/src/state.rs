use crate::error::RecognitionError;
use crate::plate::PlateEngine;
use crate::plugin::plate_reader::{record_recognition, PLUGIN_ID};
use crate::plugin::registry::PluginRegistry;
use anyhow::{Context, Result};
use common::ai_tasks::{AiResult, VideoFrame};
use common::plates::{PlateRecognizeRequest, RecognitionMode, RecognitionResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<ServiceStateInner>,
}

struct ServiceStateInner {
    node_id: String,
    plugins: PluginRegistry,
    engine: PlateEngine,
    default_mode: RecognitionMode,
}

impl ServiceState {
    pub fn new(
        node_id: String,
        plugins: PluginRegistry,
        engine: PlateEngine,
        default_mode: RecognitionMode,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceStateInner {
                node_id,
                plugins,
                engine,
                default_mode,
            }),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.inner.node_id
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.inner.plugins
    }

    pub fn engine(&self) -> &PlateEngine {
        &self.inner.engine
    }

    pub fn default_mode(&self) -> RecognitionMode {
        self.inner.default_mode
    }

    /// Run the engine on annotations supplied by the caller
    pub fn recognize(&self, request: &PlateRecognizeRequest) -> RecognitionResult {
        let start = Instant::now();
        let mode = request.mode.unwrap_or(self.inner.default_mode);
        let result = self
            .inner
            .engine
            .recognize(&request.annotations, request.image, mode);
        record_recognition(&result, start.elapsed());
        result
    }

    /// Read a plate from an encoded image through the plate reader plugin
    pub async fn read_plate(&self, frame: &VideoFrame) -> Result<RecognitionResult, RecognitionError> {
        let plugin = self
            .inner
            .plugins
            .get(PLUGIN_ID)
            .await
            .map_err(|e| RecognitionError::PluginNotReady(e.to_string()))?;

        let guard = plugin.read().await;
        let reader = guard
            .as_plate_reader()
            .ok_or_else(|| {
                RecognitionError::PluginNotReady(format!("'{}' is not a plate reader", PLUGIN_ID))
            })?;
        reader.read_frame(frame).await
    }

    /// Process a frame with a specific plugin
    pub async fn process_frame(&self, plugin_id: &str, frame: VideoFrame) -> Result<AiResult> {
        let plugin = self.inner.plugins.get(plugin_id).await?;

        let start_time = Instant::now();
        let outcome = plugin.read().await.process_frame(&frame).await;
        let processing_time = start_time.elapsed().as_millis() as u64;

        let status = if outcome.is_ok() { "success" } else { "error" };
        telemetry::metrics::AI_SERVICE_FRAMES_PROCESSED
            .with_label_values(&[plugin_id, status])
            .inc();

        let result = outcome
            .with_context(|| format!("Plugin '{}' failed to process frame", plugin_id))?;

        info!(
            plugin = %plugin_id,
            source = %frame.source_id,
            detections = result.detections.len(),
            processing_time_ms = processing_time,
            "Processed frame"
        );

        Ok(result)
    }

    pub async fn shutdown(&self) -> Result<()> {
        info!(node_id = %self.inner.node_id, "Shutting down OCR service...");
        self.inner.plugins.shutdown_all().await?;
        info!("OCR service shutdown complete");
        Ok(())
    }
}
