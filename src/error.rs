use thiserror::Error;

#[derive(Debug, Error)]
pub enum GexError {
    #[error("Unknown symbol: {0} (expected NIFTY or BANKNIFTY)")]
    UnknownSymbol(String),

    #[error("Invalid expiry date '{0}'")]
    InvalidExpiry(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Retryable error: HTTP {0}")]
    RetryableStatus(u16),

    #[error("Non-JSON response: {0}")]
    NonJsonResponse(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No data: {0}")]
    NoData(String),
}

impl From<reqwest::Error> for GexError {
    fn from(err: reqwest::Error) -> Self {
        GexError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for GexError {
    fn from(err: serde_json::Error) -> Self {
        GexError::Parse(err.to_string())
    }
}

pub type GexResult<T> = Result<T, GexError>;
