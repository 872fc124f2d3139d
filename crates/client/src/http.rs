//! HTTP implementation of [`IncidentApi`].
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so a slow
//! backend never stalls the runtime. Status codes are inspected here rather
//! than surfaced as transport errors: 401 becomes
//! [`ClientError::Unauthorized`], any other failure keeps the server's own
//! message.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use dispatch_core::{
    AssignForm, BulkRequest, EscalationForm, Incident, IncidentId, IncidentStats,
    IncidentUpdate, LoginForm, Organization, Station, User,
};

use crate::api::{paths, BulkOutcome, IncidentApi, Listing, Session, Single, StatsEnvelope};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Largest response body read into memory. Exports of the whole incident
/// list exceed ureq's 10 MiB default.
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Put,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
        }
    }
}

/// Status, content type and raw body of a completed exchange.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"))
    }
}

/// Client for the incident backend.
///
/// - `base_url` from config or `DISPATCH_API_URL`
/// - bearer token from config or `DISPATCH_TOKEN`; every call except login
///   requires one
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// No request timeout and no retries: a hung request stays pending.
    pub fn new(base_url: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        HttpClient {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(config.api.base_url.clone());
        match &config.api.token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform one exchange. Protected calls without a token fail before
    /// anything is sent.
    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        protected: bool,
    ) -> Result<RawResponse, ClientError> {
        if protected && self.token.is_none() {
            return Err(ClientError::Unauthorized {
                message: "not logged in".to_string(),
            });
        }

        let url = self.url(path);
        let agent = self.agent.clone();
        let token = self.token.clone();
        let task_url = url.clone();

        tracing::debug!(method = method.as_str(), %url, "sending request");

        let raw = tokio::task::spawn_blocking(move || {
            execute(&agent, method, &task_url, token.as_deref(), body.as_ref()).map_err(|e| {
                ClientError::Transport {
                    url: task_url.clone(),
                    message: transport_message(&e),
                }
            })
        })
        .await
        .map_err(|e| ClientError::Transport {
            url: url.clone(),
            message: format!("task join error: {}", e),
        })??;

        tracing::debug!(method = method.as_str(), %url, status = raw.status, "response");

        if raw.is_success() {
            return Ok(raw);
        }
        let message = server_message(raw.status, &raw.body);
        if raw.status == 401 {
            tracing::warn!(%url, "backend rejected credentials");
            Err(ClientError::Unauthorized { message })
        } else {
            tracing::warn!(%url, status = raw.status, %message, "request failed");
            Err(ClientError::Api {
                status: raw.status,
                message,
            })
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let raw = self.exchange(Method::Get, path, None, true).await?;
        decode(&self.url(path), &raw.body)
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        protected: bool,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        let value = serde_json::to_value(body).map_err(|e| ClientError::Decode {
            url: url.clone(),
            message: format!("could not encode request body: {}", e),
        })?;
        let raw = self.exchange(method, path, Some(value), protected).await?;
        decode(&url, &raw.body)
    }
}

fn execute(
    agent: &ureq::Agent,
    method: Method,
    url: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> Result<RawResponse, ureq::Error> {
    let auth = token.map(|t| format!("Bearer {}", t));

    let response = match method {
        Method::Get => {
            let mut request = agent.get(url).header("Accept", "application/json");
            if let Some(auth) = &auth {
                request = request.header("Authorization", auth);
            }
            request.call()?
        }
        Method::Put | Method::Post => {
            let mut request = match method {
                Method::Put => agent.put(url),
                _ => agent.post(url),
            }
            .header("Accept", "application/json");
            if let Some(auth) = &auth {
                request = request.header("Authorization", auth);
            }
            match body {
                Some(value) => request.send_json(value)?,
                None => request.send_empty()?,
            }
        }
    };

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut body = response.into_body();
    let body = body.with_config().limit(MAX_BODY_BYTES).read_to_vec()?;

    Ok(RawResponse {
        status,
        content_type,
        body,
    })
}

fn transport_message(err: &ureq::Error) -> String {
    match err {
        ureq::Error::BodyExceedsLimit(limit) => format!(
            "response body is larger than {} MiB; narrow the request",
            limit / (1024 * 1024)
        ),
        other => other.to_string(),
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// The text shown to the user for a failed request: the backend's
/// `message` (or `error`) field, else the raw body, else the status.
fn server_message(status: u16, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("request failed with status {}", status)
    } else {
        text.to_string()
    }
}

#[async_trait]
impl IncidentApi for HttpClient {
    async fn login(&self, form: &LoginForm) -> Result<Session, ClientError> {
        form.validate()?;
        self.send(Method::Post, paths::LOGIN, form, false).await
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError> {
        let listing: Listing<Incident> = self.get(paths::INCIDENTS).await?;
        Ok(listing.into_vec())
    }

    async fn get_incident(&self, id: &IncidentId) -> Result<Incident, ClientError> {
        let single: Single<Incident> = self.get(&paths::incident(id.as_str())).await?;
        Ok(single.into_inner())
    }

    async fn stats(&self) -> Result<IncidentStats, ClientError> {
        let envelope: StatsEnvelope = self.get(paths::STATS).await?;
        Ok(envelope.into_inner())
    }

    async fn update_incident(
        &self,
        id: &IncidentId,
        update: &IncidentUpdate,
    ) -> Result<Incident, ClientError> {
        let single: Single<Incident> = self
            .send(Method::Put, &paths::incident(id.as_str()), update, true)
            .await?;
        Ok(single.into_inner())
    }

    async fn assign_incident(
        &self,
        id: &IncidentId,
        form: &AssignForm,
    ) -> Result<Incident, ClientError> {
        form.validate()?;
        let single: Single<Incident> = self
            .send(Method::Put, &paths::assign(id.as_str()), form, true)
            .await?;
        Ok(single.into_inner())
    }

    async fn escalate_incident(
        &self,
        id: &IncidentId,
        form: &EscalationForm,
    ) -> Result<Incident, ClientError> {
        form.validate()?;
        let single: Single<Incident> = self
            .send(Method::Post, &paths::escalate(id.as_str()), form, true)
            .await?;
        Ok(single.into_inner())
    }

    async fn bulk(&self, request: &BulkRequest) -> Result<BulkOutcome, ClientError> {
        request.validate()?;
        let url = self.url(paths::INCIDENTS_BULK);
        let body = serde_json::to_value(request).map_err(|e| ClientError::Decode {
            url: url.clone(),
            message: format!("could not encode request body: {}", e),
        })?;
        let raw = self
            .exchange(Method::Post, paths::INCIDENTS_BULK, Some(body), true)
            .await?;

        if raw.is_json() {
            return Ok(BulkOutcome::Summary(decode(&url, &raw.body)?));
        }
        if raw.body.is_empty() {
            return Ok(BulkOutcome::Summary(serde_json::Value::Null));
        }
        Ok(BulkOutcome::Csv(raw.body))
    }

    async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let listing: Listing<User> = self.get(paths::USERS).await?;
        Ok(listing.into_vec())
    }

    async fn list_stations(&self) -> Result<Vec<Station>, ClientError> {
        let listing: Listing<Station> = self.get(paths::STATIONS).await?;
        Ok(listing.into_vec())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, ClientError> {
        let listing: Listing<Organization> = self.get(paths::ORGANIZATIONS).await?;
        Ok(listing.into_vec())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
