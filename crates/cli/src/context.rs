//! Per-invocation state: resolved configuration, the cached client, and the
//! signed-in user.
//!
//! Precedence: `dispatch.toml` < `DISPATCH_*` environment < command-line flags.

use std::sync::Arc;

use time::{OffsetDateTime, UtcOffset};

use dispatch_client::{ClientConfig, HttpClient, QueryClient, StaleTimes};
use dispatch_core::{Incident, IncidentId, User, VisibilityScope};

use crate::error::CliError;
use crate::{GlobalArgs, OutputFormat};

pub(crate) struct Context {
    pub client: Arc<QueryClient<HttpClient>>,
    pub config: ClientConfig,
    pub offset: UtcOffset,
    pub output: OutputFormat,
    pub quiet: bool,
}

impl Context {
    pub fn new(args: &GlobalArgs) -> Result<Self, CliError> {
        let mut config = ClientConfig::discover(args.config.as_deref())?.with_env();
        if let Some(url) = &args.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(token) = &args.token {
            config.api.token = Some(token.clone());
        }
        if let Some(user) = &args.user {
            config.api.user_id = Some(user.clone());
        }
        let offset = config.utc_offset()?;

        tracing::debug!(base_url = %config.api.base_url, offset = ?offset, "resolved configuration");

        let http = HttpClient::from_config(&config);
        let client = Arc::new(QueryClient::new(http, StaleTimes::from_config(&config)));
        Ok(Context {
            client,
            config,
            offset,
            output: args.output,
            quiet: args.quiet,
        })
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    pub fn is_json(&self) -> bool {
        self.output == OutputFormat::Json
    }

    /// The signed-in user. Without both a token and a user id nothing is
    /// requested and the login hint is returned.
    pub async fn user(&self) -> Result<User, CliError> {
        let (Some(_), Some(user_id)) = (&self.config.api.token, &self.config.api.user_id) else {
            return Err(CliError::LoginRequired(None));
        };
        let user = self.client.current_user(user_id).await?;
        tracing::debug!(user = %user.id, role = %user.role, "signed in");
        Ok(user)
    }

    /// Fetch one incident and make sure `user` may see it.
    pub async fn scoped_incident(&self, user: &User, id: &str) -> Result<Incident, CliError> {
        let id = IncidentId::from(normalize_id(id)?);
        let incident = self.client.incident(&id).await?;
        if !VisibilityScope::for_user(user).contains(&incident) {
            return Err(CliError::OutOfScope(incident.display_id()));
        }
        Ok(Incident::clone(&incident))
    }
}

/// Accept both raw ids and `INC-0042` references (prefix in any case).
pub(crate) fn normalize_id(raw: &str) -> Result<String, CliError> {
    let trimmed = raw.trim();
    let reference = trimmed
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("INC-"))
        .map(|_| &trimmed[4..]);

    match reference {
        Some("") => Err(CliError::Usage(format!("'{}' is not a valid incident id", raw))),
        Some(rest) if rest.chars().all(|c| c.is_ascii_digit()) => {
            let stripped = rest.trim_start_matches('0');
            if stripped.is_empty() {
                Ok("0".to_string())
            } else {
                Ok(stripped.to_string())
            }
        }
        _ if trimmed.is_empty() => Err(CliError::Usage("an id is required".to_string())),
        _ => Ok(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_references_map_back_to_ids() {
        assert_eq!(normalize_id("INC-0042").unwrap(), "42");
        assert_eq!(normalize_id("inc-12345").unwrap(), "12345");
        assert_eq!(normalize_id("Inc-0042").unwrap(), "42");
        assert_eq!(normalize_id(" 17 ").unwrap(), "17");
        assert_eq!(normalize_id("INC-0000").unwrap(), "0");
        assert_eq!(normalize_id("a1b2-uuid").unwrap(), "a1b2-uuid");
    }

    #[test]
    fn bare_prefix_and_blank_ids_are_rejected() {
        let err = normalize_id("INC-").unwrap_err();
        assert_eq!(err.to_string(), "'INC-' is not a valid incident id");
        assert!(matches!(normalize_id("inc-"), Err(CliError::Usage(_))));
        assert!(matches!(normalize_id("   "), Err(CliError::Usage(_))));
    }
}
