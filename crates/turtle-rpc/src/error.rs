//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("authentication failed for {url}")]
    AuthFailed { url: String },

    #[error("no result in {endpoint} response")]
    NoResult { endpoint: String },

    #[error("daemon rejected {endpoint}: status {status:?}")]
    DaemonError { endpoint: String, status: String },

    #[error("malformed field {field} in {endpoint} response")]
    MalformedResponse {
        endpoint: String,
        field: &'static str,
    },
}

impl RpcError {
    /// Whether a retry within the same call might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Http { .. } | RpcError::Timeout { .. } => true,
            RpcError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = RpcError::Timeout {
            endpoint: "/info".into(),
        };
        assert!(timeout.is_transient());

        let server_error = RpcError::HttpStatus {
            endpoint: "/info".into(),
            status: 503,
            body: String::new(),
        };
        assert!(server_error.is_transient());

        let client_error = RpcError::HttpStatus {
            endpoint: "/info".into(),
            status: 404,
            body: String::new(),
        };
        assert!(!client_error.is_transient());

        let rejected = RpcError::DaemonError {
            endpoint: "/fee".into(),
            status: "FAILED".into(),
        };
        assert!(!rejected.is_transient());
    }
}
