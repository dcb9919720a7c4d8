use thiserror::Error;

/// Failures of a backend call, as surfaced to the admin user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    /// The request never completed (connection refused, DNS, body read).
    #[error("Request failed: {0}")]
    Network(String),

    /// Non-2xx status. The body is kept so the user sees what the server said.
    #[error("Server error {status}\n{body}")]
    Server { status: u16, body: String },

    /// 2xx response carrying `ok: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unrecognized response shape: {0}")]
    UnexpectedShape(String),
}

impl AdminError {
    pub fn is_network(&self) -> bool {
        matches!(self, AdminError::Network(_))
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(e: serde_json::Error) -> Self {
        AdminError::Parse(e.to_string())
    }
}
