use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Sessions(#[from] reelpost_sessions::Error),

    #[error("invalid telegram api url {url}: {message}")]
    ApiUrl { url: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
