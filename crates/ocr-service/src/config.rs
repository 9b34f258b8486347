use crate::plate::PlateEngineConfig;
use anyhow::{anyhow, Context, Result};
use common::plates::RecognitionMode;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8085";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to
    pub bind_addr: String,

    /// Node ID for this service instance
    pub node_id: String,

    /// Optional JSON file with engine thresholds
    pub engine_config_path: Option<PathBuf>,

    /// Strategy used when a request does not choose one
    pub default_mode: RecognitionMode,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr =
            env::var("OCR_SERVICE_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let node_id = env::var("NODE_ID").unwrap_or_else(|_| {
            format!(
                "ocr-service-{}",
                hostname::get()
                    .ok()
                    .and_then(|h| h.into_string().ok())
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
            )
        });

        let engine_config_path = env::var("PLATE_ENGINE_CONFIG").ok().map(PathBuf::from);

        let default_mode = match env::var("PLATE_RECOGNITION_MODE") {
            Ok(raw) => raw
                .parse::<RecognitionMode>()
                .map_err(|e| anyhow!(e))
                .context("Invalid PLATE_RECOGNITION_MODE")?,
            Err(_) => RecognitionMode::default(),
        };

        Ok(Self {
            bind_addr,
            node_id,
            engine_config_path,
            default_mode,
        })
    }

    /// Engine thresholds from the configured file, or the defaults
    pub fn engine_config(&self) -> Result<PlateEngineConfig> {
        match &self.engine_config_path {
            Some(path) => PlateEngineConfig::from_file(path),
            None => Ok(PlateEngineConfig::default()),
        }
    }
}
