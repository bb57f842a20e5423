use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failure talking to the metadata provider or fetching a song page.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("deadline exceeded")]
    Deadline,
}

impl ProviderError {
    /// Timeouts, connection failures, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(e) => e.is_timeout() || e.is_connect(),
            ProviderError::Status(s) => {
                *s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
            }
            ProviderError::Malformed(_) | ProviderError::Deadline => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    ProviderError,
    ExtractionFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::ExtractionFailure => "extraction_failure",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Terminal outcome of a lookup that produced no lyrics URL or text.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("{0}")]
    Extraction(String),
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::InvalidInput(_) => ErrorKind::InvalidInput,
            LookupError::NotFound(_) => ErrorKind::NotFound,
            LookupError::Provider(_) => ErrorKind::ProviderError,
            LookupError::Extraction(_) => ErrorKind::ExtractionFailure,
        }
    }

    /// Process exit status used by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::NotFound | ErrorKind::ExtractionFailure => 1,
            ErrorKind::InvalidInput => 2,
            ErrorKind::ProviderError => 3,
        }
    }
}

/// JSON body for a terminal error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&LookupError> for ErrorBody {
    fn from(e: &LookupError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind(),
        }
    }
}
