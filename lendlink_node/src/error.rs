// src/error.rs
// Error taxonomy shared by the validator, builder and storage layers

use thiserror::Error;

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid transaction type. Supported: supply, withdraw, borrow, repay")]
    InvalidAction,

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Invalid token: {0}")]
    UnsupportedToken(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LinkError {
    /// Stable machine-readable code, returned to HTTP callers next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::MalformedRequest(_) => "MalformedRequest",
            LinkError::InvalidAction => "InvalidAction",
            LinkError::UnsupportedAction(_) => "UnsupportedAction",
            LinkError::UnsupportedToken(_) => "UnsupportedToken",
            LinkError::InvalidAmount(_) => "InvalidAmount",
            LinkError::Storage(_) => "Storage",
            LinkError::Serialization(_) => "Serialization",
        }
    }

    /// True for errors caused by the caller's input rather than by the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LinkError::MalformedRequest(_)
                | LinkError::InvalidAction
                | LinkError::UnsupportedAction(_)
                | LinkError::UnsupportedToken(_)
                | LinkError::InvalidAmount(_)
        )
    }
}

impl From<sled::Error> for LinkError {
    fn from(e: sled::Error) -> Self {
        LinkError::Storage(e.to_string())
    }
}
