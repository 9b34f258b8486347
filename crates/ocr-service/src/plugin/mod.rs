//! Frame plugins hosted by the OCR service.
//!
//! The service ships a single [`plate_reader::PlateReaderPlugin`]; the
//! registry keeps plugins behind the [`AiPlugin`] trait so the frame and
//! health routes stay plugin-agnostic.

pub mod plate_reader;
pub mod registry;

use anyhow::Result;
use async_trait::async_trait;
use common::ai_tasks::{AiResult, PluginInfo, VideoFrame};
use plate_reader::PlateReaderPlugin;

#[async_trait]
pub trait AiPlugin: Send + Sync {
    /// Registry key and `plugin_type` of produced results
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// JSON Schema of the value accepted by [`AiPlugin::init`]
    fn config_schema(&self) -> Option<serde_json::Value> {
        None
    }

    /// Image encodings accepted in `VideoFrame::data`
    fn supported_formats(&self) -> Vec<String> {
        vec!["jpeg".to_string()]
    }

    /// Annotation provider the plugin sends images to, if one is attached
    fn annotation_provider(&self) -> Option<&'static str> {
        None
    }

    /// The plate reader behind this plugin, for routes that need the full
    /// recognition result rather than an [`AiResult`]
    fn as_plate_reader(&self) -> Option<&PlateReaderPlugin> {
        None
    }

    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            version: self.version().to_string(),
            config_schema: self.config_schema(),
            supported_formats: self.supported_formats(),
            annotation_provider: self.annotation_provider().map(str::to_string),
        }
    }

    async fn init(&mut self, config: serde_json::Value) -> Result<()>;

    async fn process_frame(&self, frame: &VideoFrame) -> Result<AiResult>;

    /// Readiness as reported by `/readyz`
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}
