use super::{record_provider_request, AnnotationProvider};
use crate::error::RecognitionError;
use async_trait::async_trait;
use common::plates::{ImageAnnotations, RawObjectAnnotation, RawWordAnnotation};

/// Provider answering every image with the same annotations.
///
/// Used for replaying recorded responses and for tests. The unavailable
/// variant fails every call the way an unreachable upstream would.
#[derive(Debug, Clone)]
pub struct StaticAnnotationProvider {
    annotations: ImageAnnotations,
    failure: Option<String>,
}

impl StaticAnnotationProvider {
    pub fn new(annotations: ImageAnnotations) -> Self {
        Self {
            annotations,
            failure: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            annotations: ImageAnnotations::default(),
            failure: Some(message.into()),
        }
    }

    fn check(&self) -> Result<(), RecognitionError> {
        match &self.failure {
            Some(message) => {
                record_provider_request(self.name(), "error");
                Err(RecognitionError::unavailable(self.name(), message.clone()))
            }
            None => {
                record_provider_request(self.name(), "success");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AnnotationProvider for StaticAnnotationProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn detect_text(&self, _image: &[u8]) -> Result<Vec<RawWordAnnotation>, RecognitionError> {
        self.check()?;
        Ok(self.annotations.words.clone())
    }

    async fn detect_objects(
        &self,
        _image: &[u8],
    ) -> Result<Vec<RawObjectAnnotation>, RecognitionError> {
        self.check()?;
        Ok(self.annotations.objects.clone())
    }

    async fn annotate(&self, _image: &[u8]) -> Result<ImageAnnotations, RecognitionError> {
        self.check()?;
        Ok(self.annotations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_fixture() {
        let annotations = ImageAnnotations::from_text("ABC 123");
        let provider = StaticAnnotationProvider::new(annotations.clone());
        assert_eq!(provider.annotate(b"").await.unwrap(), annotations);
        assert!(provider.detect_objects(b"").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_provider_fails_every_call() {
        let provider = StaticAnnotationProvider::unavailable("connection refused");
        assert!(provider.annotate(b"").await.unwrap_err().is_unavailable());
        assert!(provider.detect_text(b"").await.is_err());
    }
}
