use thiserror::Error;

/// Failures on the recognition path.
///
/// "No plate found" is not an error: it is an empty
/// [`RecognitionResult`](common::plates::RecognitionResult).
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The annotation provider could not be reached or rejected the request
    #[error("annotation provider '{provider}' unavailable: {message}")]
    Unavailable {
        provider: &'static str,
        message: String,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("plugin not ready: {0}")]
    PluginNotReady(String),
}

impl RecognitionError {
    pub fn unavailable(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
