//! Replay a recorded annotation payload through the plate engine.
//!
//! Accepts either a `/v1/plates/recognize` request body or a raw
//! `images:annotate` response, and prints the recognition result as JSON.
//!
//! ```bash
//! plate-replay fixtures/car.json
//! plate-replay gcv-response.json --width 1280 --height 720 --mode geometric --pretty
//! plate-replay lines.json --mode pattern --config engine.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use common::plates::{ImageDescriptor, PlateRecognizeRequest, RecognitionMode};
use ocr_service::provider::google_vision::BatchAnnotateResponse;
use ocr_service::{PlateEngine, PlateEngineConfig};
use std::path::PathBuf;
use tracing::debug;

/// Run the plate engine on a recorded annotation payload
#[derive(Parser, Debug)]
#[command(name = "plate-replay")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON payload: a recognize request or a raw images:annotate response
    input: PathBuf,

    /// Recognition strategy (auto, geometric, pattern)
    #[arg(short, long, env = "PLATE_RECOGNITION_MODE")]
    mode: Option<RecognitionMode>,

    /// Engine configuration file
    #[arg(short, long, env = "PLATE_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Image width in pixels, overrides the payload
    #[arg(long)]
    width: Option<i64>,

    /// Image height in pixels, overrides the payload
    #[arg(long)]
    height: Option<i64>,

    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

fn load_request(value: serde_json::Value) -> Result<PlateRecognizeRequest> {
    if value.get("responses").is_some() {
        let batch: BatchAnnotateResponse =
            serde_json::from_value(value).context("Invalid images:annotate response")?;
        let annotations = batch.into_annotations()?;
        return Ok(PlateRecognizeRequest {
            annotations,
            ..Default::default()
        });
    }
    serde_json::from_value(value).context("Invalid recognize request")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = telemetry::init_structured_logging(
        telemetry::LogConfig::new("plate-replay")
            .with_format(telemetry::LogFormat::Compact)
            .with_stderr(),
    );

    let engine_config = match &args.config {
        Some(path) => PlateEngineConfig::from_file(path)?,
        None => PlateEngineConfig::default(),
    };
    let engine = PlateEngine::new(engine_config);

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.input.display()))?;
    let request = load_request(value)?;

    let image = ImageDescriptor::new(
        args.width.unwrap_or(request.image.width),
        args.height.unwrap_or(request.image.height),
    );
    let mode = args.mode.or(request.mode).unwrap_or_default();
    debug!(
        words = request.annotations.words.len(),
        objects = request.annotations.objects.len(),
        width = image.width,
        height = image.height,
        %mode,
        "replaying payload"
    );

    let result = engine.recognize(&request.annotations, image, mode);

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_provider_response_is_detected() {
        let request = load_request(json!({
            "responses": [{
                "textAnnotations": [{"description": "ABC 123"}]
            }]
        }))
        .unwrap();
        assert_eq!(request.annotations.full_text(), "ABC 123");
        assert_eq!(request.image, ImageDescriptor::default());
    }

    #[test]
    fn test_recognize_request_is_accepted() {
        let request = load_request(json!({
            "image": {"width": 200, "height": 100},
            "full_text": "XYZ 789",
            "mode": "pattern"
        }))
        .unwrap();
        assert_eq!(request.mode, Some(RecognitionMode::Pattern));
        assert_eq!(request.annotations.full_text(), "XYZ 789");
    }

    #[test]
    fn test_provider_error_fails_replay() {
        let err = load_request(json!({
            "responses": [{"error": {"code": 7, "message": "API key invalid"}}]
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "plate-replay",
            "payload.json",
            "--mode",
            "geometric",
            "--width",
            "640",
            "--pretty",
        ])
        .unwrap();
        assert_eq!(args.mode, Some(RecognitionMode::Geometric));
        assert_eq!(args.width, Some(640));
        assert!(args.pretty);
    }
}
