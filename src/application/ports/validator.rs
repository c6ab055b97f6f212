use async_trait::async_trait;

use crate::domain::MediaRef;

#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, media: &MediaRef) -> Result<(), ValidatorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("corrupt file: {0}")]
    CorruptFile(String),
    #[error("media unavailable: {0}")]
    Unavailable(String),
}
