#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid data from API: missing field `{field}`.")]
    MissingField { field: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Invalid email: {message}")]
    InvalidEmail { message: String },

    #[error("Unexpected error: {message}")]
    UnexpectedResult { message: String },
}

impl From<wreq::Error> for BackendError {
    fn from(e: wreq::Error) -> Self {
        BackendError::RequestFailed(Box::new(e))
    }
}

impl From<jsonwebtoken::errors::Error> for BackendError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        BackendError::AuthFailed {
            message: e.to_string(),
        }
    }
}

impl From<lettre::address::AddressError> for BackendError {
    fn from(e: lettre::address::AddressError) -> Self {
        BackendError::InvalidEmail {
            message: e.to_string(),
        }
    }
}

impl From<lettre::error::Error> for BackendError {
    fn from(e: lettre::error::Error) -> Self {
        BackendError::InvalidEmail {
            message: e.to_string(),
        }
    }
}
