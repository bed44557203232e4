use crate::models::RpcStatus;
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by the tenant API client and the query cache.
///
/// Cloneable so that every caller coalesced onto one fetch receives the same
/// failure.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// A required parameter was missing or empty; no request was sent.
    #[error("Required parameter \"{parameter}\" was missing when calling {operation}()")]
    Parameter {
        operation: &'static str,
        parameter: &'static str,
    },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection or protocol failure; there is no response body.
    #[error("Network error: {0}")]
    Network(#[source] Arc<reqwest::Error>),

    /// The service answered with a non-2xx status.
    #[error("Remote error {status}: {envelope}")]
    Remote { status: u16, envelope: RpcStatus },

    /// The service answered 2xx with a body that does not match the model.
    #[error("Failed to decode response with status {status}: {source}")]
    Decode {
        status: u16,
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// The shared fetch ended without producing a result.
    #[error("Fetch for {0} was aborted before completing")]
    Aborted(String),
}

impl ClientError {
    pub fn network(err: reqwest::Error) -> Self {
        ClientError::Network(Arc::new(err))
    }

    pub fn encode(err: serde_json::Error) -> Self {
        ClientError::Encode(Arc::new(err))
    }

    pub fn decode(status: u16, err: serde_json::Error) -> Self {
        ClientError::Decode {
            status,
            source: Arc::new(err),
        }
    }

    /// HTTP status of the response that caused the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } | ClientError::Decode { status, .. } => {
                Some(*status)
            }
            ClientError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, ClientError::Parameter { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
