use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Analysis service is not reachable at {0}")]
    Connection(String),

    #[error("Analysis service returned error (status {status}): {detail}")]
    Status { status: u16, detail: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Invalid response data: {0}")]
    InvalidData(String),

    #[error("Cannot read document: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Message fit for an inline notice: the server's `detail` when it
    /// sent one, the error text otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
