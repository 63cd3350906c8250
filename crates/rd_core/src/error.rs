use thiserror::Error;

/// Failures reported by a remote news source.
///
/// The `Display` text is what the reader shows in its error banner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Invalid response from server")]
    InvalidResponse,

    #[error("No data received")]
    NoData,

    #[error("Failed to decode data")]
    Decoding,

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error came from the remote source rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Api(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Error::Api(ApiError::InvalidUrl)
        } else if err.is_decode() {
            Error::Api(ApiError::Decoding)
        } else if err.is_status() {
            Error::Api(ApiError::InvalidResponse)
        } else {
            Error::Api(ApiError::Network(err.to_string()))
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(_: url::ParseError) -> Self {
        Error::Api(ApiError::InvalidUrl)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
