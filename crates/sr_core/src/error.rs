use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Summary not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, Error>;
