use vox_containers::error::ContainerErrors;
use vox_decode::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("Malformed response: {0}")]
    Protocol(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Configuration(&'static str),
    #[error("{failed} of {total} requests failed, first error: {first}")]
    Aggregate {
        failed: usize,
        total: usize,
        first: Box<StreamError>,
    },
    #[error("Request cancelled")]
    Cancelled,
}

impl StreamError {
    /// Network or HTTP level failure, as opposed to a bad payload
    pub fn is_transport(&self) -> bool {
        matches!(self, StreamError::Http(_) | StreamError::Status { .. })
    }
}

impl From<ContainerErrors> for StreamError {
    fn from(value: ContainerErrors) -> Self {
        StreamError::Protocol(value.to_string())
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(value: serde_json::Error) -> Self {
        StreamError::Protocol(value.to_string())
    }
}
