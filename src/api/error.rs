//! Transport-level failures of a GraphQL request.

use thiserror::Error;

/// Anything that stopped a query from producing a decodable GraphQL response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Endpoint returned status: {0}")]
    Status(u16),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}
