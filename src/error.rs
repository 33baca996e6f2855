use thiserror::Error;

/// Failure of a single call against the music catalog provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Timeout | CatalogError::Transport(_) => true,
            CatalogError::Status(code) => *code == 429 || *code >= 500,
            CatalogError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            CatalogError::Status(status.as_u16())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum EmotuneError {
    #[error("no face detected in frame")]
    NoFaceDetected,
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("invalid emotion '{0}'")]
    InvalidEmotion(String),
    #[error("music provider authentication unavailable: {0}")]
    AuthUnavailable(#[source] CatalogError),
    #[error("recommendations unavailable: fallback search failed: {fallback}")]
    RecommendationUnavailable {
        /// `None` when the primary query succeeded but returned no tracks.
        primary: Option<CatalogError>,
        fallback: CatalogError,
    },
    #[error("music catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),
    #[error("no recommendations found")]
    NoRecommendations,
}

pub type Result<T> = std::result::Result<T, EmotuneError>;

impl EmotuneError {
    /// True when the same call may succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmotuneError::AuthUnavailable(e) | EmotuneError::CatalogUnavailable(e) => e.is_retryable(),
            EmotuneError::RecommendationUnavailable { fallback, .. } => fallback.is_retryable(),
            _ => false,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            EmotuneError::NoFaceDetected
            | EmotuneError::InvalidImage(_)
            | EmotuneError::InvalidEmotion(_) => 400,
            EmotuneError::NoRecommendations => 404,
            EmotuneError::AuthUnavailable(_)
            | EmotuneError::RecommendationUnavailable { .. }
            | EmotuneError::CatalogUnavailable(_) => 502,
            EmotuneError::ModelUnavailable(_) => 503,
            EmotuneError::Inference(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(EmotuneError::AuthUnavailable(CatalogError::Timeout).is_retryable());
        assert!(!EmotuneError::AuthUnavailable(CatalogError::Status(401)).is_retryable());
        let err = EmotuneError::RecommendationUnavailable {
            primary: Some(CatalogError::Status(404)),
            fallback: CatalogError::Status(503),
        };
        assert!(err.is_retryable());
        assert!(!EmotuneError::NoRecommendations.is_retryable());
        assert!(!EmotuneError::InvalidEmotion("bored".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(EmotuneError::NoFaceDetected.status_code(), 400);
        assert_eq!(EmotuneError::NoRecommendations.status_code(), 404);
        assert_eq!(EmotuneError::ModelUnavailable("missing".into()).status_code(), 503);
        assert_eq!(EmotuneError::AuthUnavailable(CatalogError::Timeout).status_code(), 502);
    }

    #[test]
    fn test_messages_are_descriptive() {
        let err = EmotuneError::InvalidEmotion("bored".into());
        assert_eq!(err.to_string(), "invalid emotion 'bored'");
        let err = EmotuneError::AuthUnavailable(CatalogError::Status(400));
        assert!(err.to_string().contains("HTTP 400"));
    }
}
