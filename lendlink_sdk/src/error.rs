use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl SdkError {
    /// True when the service answered 404 (unknown or expired link).
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::Api { status: 404, .. })
    }
}
