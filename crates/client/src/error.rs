use dispatch_core::ValidationErrors;

/// Everything that can go wrong between a view and the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 401 from the backend, or no token configured for a protected call.
    /// Views react by sending the user to the login prompt.
    #[error("authentication required: {message}")]
    Unauthorized { message: String },

    /// Any other non-2xx response. `message` is the server's own text and is
    /// shown to the user verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, refused, reset).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// A 2xx response whose body did not have the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The viewer's action menu does not offer this action on the incident.
    #[error("'{action}' is not available on incident {incident}")]
    NotPermitted { action: String, incident: String },

    /// Form rejected client-side; nothing was sent.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// Bad or missing configuration (config file, base URL, offset).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// HTTP status if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
