//! Error types for Flyt.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing forward_url or api_key")]
    MissingControl,

    #[error("invalid forward_url")]
    InvalidForwardUrl,

    #[error("invalid api_key")]
    InvalidApiKey,

    #[error("{0}")]
    InvalidForm(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("{0}")]
    Build(String),

    #[error("{0}")]
    Upstream(String),
}

impl Error {
    /// HTTP status code reported to the caller
    pub fn status(&self) -> u16 {
        match self {
            Error::MissingControl
            | Error::InvalidForwardUrl
            | Error::InvalidApiKey
            | Error::InvalidForm(_) => 400,
            Error::MethodNotAllowed(_) => 405,
            Error::Build(_) => 500,
            Error::Upstream(_) => 502,
        }
    }
}
