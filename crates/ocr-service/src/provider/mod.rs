//! Image annotation providers.
//!
//! A provider turns encoded image bytes into word and object annotations.
//! The plate engine never talks to a provider itself; the plate reader
//! plugin calls one and hands the annotations over.

pub mod fixture;
pub mod google_vision;

use crate::error::RecognitionError;
use async_trait::async_trait;
use common::plates::{ImageAnnotations, RawObjectAnnotation, RawWordAnnotation};

pub use fixture::StaticAnnotationProvider;
pub use google_vision::{GoogleVisionConfig, GoogleVisionProvider};

#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    /// Short provider name used in logs, metrics and errors
    fn name(&self) -> &'static str;

    /// Word annotations; index 0 is the full text block when present
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<RawWordAnnotation>, RecognitionError>;

    /// Localized objects with normalized vertices
    async fn detect_objects(
        &self,
        image: &[u8],
    ) -> Result<Vec<RawObjectAnnotation>, RecognitionError>;

    /// Text and objects for one image. Providers that can answer both in a
    /// single request should override this.
    async fn annotate(&self, image: &[u8]) -> Result<ImageAnnotations, RecognitionError> {
        let words = self.detect_text(image).await?;
        let objects = self.detect_objects(image).await?;
        Ok(ImageAnnotations::new(words, objects))
    }
}

/// Record the outcome of a provider call
pub(crate) fn record_provider_request(provider: &str, status: &str) {
    telemetry::metrics::ANNOTATION_PROVIDER_REQUESTS
        .with_label_values(&[provider, status])
        .inc();
}
