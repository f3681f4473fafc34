use thiserror::Error;

use crate::caption::FormatError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("default caption template is unusable: {0}")]
    DefaultTemplate(#[from] FormatError),

    #[error("invalid publishing settings: {message}")]
    InvalidSettings { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
