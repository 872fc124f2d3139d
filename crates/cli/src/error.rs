use dispatch_client::ClientError;

pub(crate) const LOGIN_HINT: &str =
    "please log in: run `dispatch login` and export DISPATCH_TOKEN and DISPATCH_USER_ID";

/// Everything a subcommand can fail with. All of them exit with status 1.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// No token or user id, or the backend rejected them.
    #[error("{}", login_message(.0))]
    LoginRequired(Option<String>),

    #[error("incident {0} is outside your visibility scope")]
    OutOfScope(String),

    #[error("{0}")]
    Usage(String),

    #[error("could not write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Client(ClientError),
}

fn login_message(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{} ({})", LOGIN_HINT, detail),
        None => LOGIN_HINT.to_string(),
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized { message } => CliError::LoginRequired(Some(message)),
            other => CliError::Client(other),
        }
    }
}
