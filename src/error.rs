use thiserror::Error;

#[derive(Debug, Error)]
pub enum StylegenError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Response error: {0}")]
    Response(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StylegenError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StylegenError::Response(e.to_string())
        } else {
            StylegenError::Request(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StylegenError {
    fn from(e: serde_json::Error) -> Self {
        StylegenError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StylegenError>;
