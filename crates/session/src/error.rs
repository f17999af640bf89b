use nanogen_service::ServiceError;

/// Terminal failure of a session.
///
/// The `Display` text is what the controller publishes as the state error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Input is empty.")]
    EmptyInput,

    #[error("feature not available on this device")]
    FeatureUnavailable,

    #[error("model already downloading, wait")]
    FeatureBusy,

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<ServiceError> for SessionError {
    fn from(e: ServiceError) -> Self {
        SessionError::UnexpectedError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
