//! Google Cloud Vision `images:annotate` over REST.

use super::{record_provider_request, AnnotationProvider};
use crate::error::RecognitionError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use common::plates::{
    ImageAnnotations, NormalizedVertex, RawObjectAnnotation, RawWordAnnotation, Vertex,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_LOCALE_HINT: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const PROVIDER: &str = "google_vision";
const TEXT_DETECTION: &str = "TEXT_DETECTION";
const OBJECT_LOCALIZATION: &str = "OBJECT_LOCALIZATION";

#[derive(Debug, Clone)]
pub struct GoogleVisionConfig {
    pub api_key: String,
    pub endpoint: Url,
    /// Language hint sent with every request
    pub locale_hint: String,
    pub timeout: Duration,
}

impl GoogleVisionConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            endpoint: Url::parse(DEFAULT_ENDPOINT).context("Invalid default endpoint")?,
            locale_hint: DEFAULT_LOCALE_HINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Read the provider settings; `None` when `GCV_API_KEY` is not set
    pub fn from_env() -> Result<Option<Self>> {
        let Some(api_key) = env::var("GCV_API_KEY").ok().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let mut config = Self::new(api_key)?;

        if let Ok(endpoint) = env::var("GCV_ENDPOINT") {
            config.endpoint = Url::parse(&endpoint).context("Invalid GCV_ENDPOINT")?;
        }
        if let Ok(hint) = env::var("GCV_LOCALE_HINT") {
            config.locale_hint = hint;
        }
        if let Ok(secs) = env::var("GCV_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().context("Invalid GCV_TIMEOUT_SECS")?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(Some(config))
    }
}

pub struct GoogleVisionProvider {
    config: GoogleVisionConfig,
    client: reqwest::Client,
}

impl GoogleVisionProvider {
    pub fn new(config: GoogleVisionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GoogleVisionConfig {
        &self.config
    }

    fn build_request(&self, image: &[u8], features: &[&str]) -> BatchAnnotateRequest {
        BatchAnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: base64::prelude::BASE64_STANDARD.encode(image),
                },
                features: features
                    .iter()
                    .map(|f| Feature {
                        kind: f.to_string(),
                    })
                    .collect(),
                image_context: ImageContext {
                    language_hints: vec![self.config.locale_hint.clone()],
                },
            }],
        }
    }

    #[instrument(skip_all, fields(features = ?features, bytes = image.len()))]
    async fn call(&self, image: &[u8], features: &[&str]) -> Result<ImageAnnotations, RecognitionError> {
        let request = self.build_request(image, features);
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.config.api_key);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                record_provider_request(PROVIDER, "error");
                warn!(error = %e, "annotation request failed");
                RecognitionError::unavailable(PROVIDER, format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            record_provider_request(PROVIDER, "error");
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "annotation request rejected");
            return Err(RecognitionError::unavailable(
                PROVIDER,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let batch: BatchAnnotateResponse = response.json().await.map_err(|e| {
            record_provider_request(PROVIDER, "error");
            RecognitionError::unavailable(PROVIDER, format!("invalid response: {}", e))
        })?;

        let annotations = batch.into_annotations().inspect_err(|_| {
            record_provider_request(PROVIDER, "error");
        })?;
        record_provider_request(PROVIDER, "success");
        debug!(
            words = annotations.words.len(),
            objects = annotations.objects.len(),
            "annotation response received"
        );
        Ok(annotations)
    }
}

#[async_trait]
impl AnnotationProvider for GoogleVisionProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn detect_text(&self, image: &[u8]) -> Result<Vec<RawWordAnnotation>, RecognitionError> {
        Ok(self.call(image, &[TEXT_DETECTION]).await?.words)
    }

    async fn detect_objects(
        &self,
        image: &[u8],
    ) -> Result<Vec<RawObjectAnnotation>, RecognitionError> {
        Ok(self.call(image, &[OBJECT_LOCALIZATION]).await?.objects)
    }

    /// Both features in one request
    async fn annotate(&self, image: &[u8]) -> Result<ImageAnnotations, RecognitionError> {
        self.call(image, &[TEXT_DETECTION, OBJECT_LOCALIZATION]).await
    }
}

// ==== Wire format ====

#[derive(Debug, Serialize)]
pub struct BatchAnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
    pub image_context: ImageContext,
}

#[derive(Debug, Serialize)]
pub struct ImageContent {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContext {
    pub language_hints: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchAnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    pub localized_object_annotations: Vec<LocalizedObjectAnnotation>,
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedObjectAnnotation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<WireVertex>,
    #[serde(default)]
    pub normalized_vertices: Vec<WireNormalizedVertex>,
}

/// Omitted coordinates are zero on the wire
#[derive(Debug, Default, Deserialize)]
pub struct WireVertex {
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireNormalizedVertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl BatchAnnotateResponse {
    /// Annotations of the first image.
    ///
    /// An empty batch means nothing was detected. A per-image error means
    /// the provider failed and is reported as unavailable.
    pub fn into_annotations(self) -> Result<ImageAnnotations, RecognitionError> {
        let Some(first) = self.responses.into_iter().next() else {
            return Ok(ImageAnnotations::default());
        };

        if let Some(status) = first.error {
            return Err(RecognitionError::unavailable(
                PROVIDER,
                format!("image error {}: {}", status.code, status.message),
            ));
        }

        let words = first
            .text_annotations
            .into_iter()
            .map(|entity| {
                let vertices = entity
                    .bounding_poly
                    .map(|poly| {
                        poly.vertices
                            .into_iter()
                            .map(|v| Vertex::new(v.x, v.y))
                            .collect()
                    })
                    .unwrap_or_default();
                RawWordAnnotation::new(entity.description, vertices)
            })
            .collect();

        let objects = first
            .localized_object_annotations
            .into_iter()
            .map(|object| {
                let vertices = object
                    .bounding_poly
                    .map(|poly| {
                        poly.normalized_vertices
                            .into_iter()
                            .map(|v| NormalizedVertex::new(v.x, v.y))
                            .collect()
                    })
                    .unwrap_or_default();
                RawObjectAnnotation::new(object.name, vertices)
            })
            .collect();

        Ok(ImageAnnotations::new(words, objects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ImageAnnotations, RecognitionError> {
        serde_json::from_value::<BatchAnnotateResponse>(value)
            .unwrap()
            .into_annotations()
    }

    #[test]
    fn test_response_is_converted() {
        let annotations = parse(json!({
            "responses": [{
                "textAnnotations": [
                    {"description": "AB 12\n", "boundingPoly": {"vertices": [
                        {"x": 40, "y": 70}, {"x": 85, "y": 70}, {"x": 85, "y": 90}, {"x": 40, "y": 90}
                    ]}},
                    {"description": "AB", "boundingPoly": {"vertices": [
                        {"y": 70}, {"x": 60, "y": 70}, {"x": 60, "y": 90}, {"y": 90}
                    ]}}
                ],
                "localizedObjectAnnotations": [
                    {"name": "Car", "score": 0.93, "boundingPoly": {"normalizedVertices": [
                        {}, {"x": 1.0}, {"x": 1.0, "y": 1.0}, {"y": 1.0}
                    ]}}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(annotations.words.len(), 2);
        assert_eq!(annotations.full_text(), "AB 12\n");
        // Omitted x means 0
        assert_eq!(annotations.words[1].vertices[0], Vertex::new(0, 70));
        assert_eq!(annotations.objects[0].label, "Car");
        assert_eq!(
            annotations.objects[0].normalized_vertices[0],
            NormalizedVertex::new(0.0, 0.0)
        );
    }

    #[test]
    fn test_empty_batch_is_no_detection() {
        let annotations = parse(json!({"responses": []})).unwrap();
        assert!(annotations.is_empty());

        let annotations = parse(json!({"responses": [{}]})).unwrap();
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_image_error_is_unavailable() {
        let err = parse(json!({
            "responses": [{"error": {"code": 3, "message": "Bad image data."}}]
        }))
        .unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("Bad image data."));
    }

    #[test]
    fn test_request_body_shape() {
        let config = GoogleVisionConfig::new("secret").unwrap();
        let provider = GoogleVisionProvider::new(config).unwrap();
        let request = provider.build_request(b"\xff\xd8", &[TEXT_DETECTION, OBJECT_LOCALIZATION]);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "requests": [{
                    "image": {"content": "/9g="},
                    "features": [{"type": "TEXT_DETECTION"}, {"type": "OBJECT_LOCALIZATION"}],
                    "imageContext": {"languageHints": ["en"]}
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let mut config = GoogleVisionConfig::new("secret").unwrap();
        config.endpoint = Url::parse("http://127.0.0.1:1/v1/images:annotate").unwrap();
        config.timeout = Duration::from_secs(2);
        let provider = GoogleVisionProvider::new(config).unwrap();

        let err = provider.annotate(b"image").await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
