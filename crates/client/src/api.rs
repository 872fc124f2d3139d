//! The backend surface this client consumes.
//!
//! [`IncidentApi`] is the seam between views and transport: the HTTP
//! implementation lives in [`crate::http`], tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dispatch_core::{
    AssignForm, BulkRequest, EscalationForm, Incident, IncidentId, IncidentStats,
    IncidentUpdate, LoginForm, Organization, Station, User,
};

use crate::error::ClientError;

/// Endpoint paths, relative to the configured base URL.
pub mod paths {
    pub const LOGIN: &str = "/api/auth/login";
    pub const INCIDENTS: &str = "/api/incidents";
    pub const INCIDENTS_BULK: &str = "/api/incidents/bulk";
    pub const STATS: &str = "/api/stats";
    pub const USERS: &str = "/api/users";
    pub const STATIONS: &str = "/api/stations";
    pub const ORGANIZATIONS: &str = "/api/organizations";

    pub fn incident(id: &str) -> String {
        format!("{}/{}", INCIDENTS, id)
    }

    pub fn assign(id: &str) -> String {
        format!("{}/{}/assign", INCIDENTS, id)
    }

    pub fn escalate(id: &str) -> String {
        format!("{}/{}/escalate", INCIDENTS, id)
    }
}

/// Successful login: bearer token plus the account it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Result of a bulk operation. `export` answers with CSV bytes, everything
/// else with a JSON summary.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    Summary(serde_json::Value),
    Csv(Vec<u8>),
}

impl BulkOutcome {
    pub fn csv(&self) -> Option<&[u8]> {
        match self {
            BulkOutcome::Csv(bytes) => Some(bytes),
            BulkOutcome::Summary(_) => None,
        }
    }
}

#[async_trait]
pub trait IncidentApi: Send + Sync + 'static {
    /// `POST /api/auth/login`
    async fn login(&self, form: &LoginForm) -> Result<Session, ClientError>;

    /// `GET /api/incidents`
    async fn list_incidents(&self) -> Result<Vec<Incident>, ClientError>;

    /// `GET /api/incidents/:id`
    async fn get_incident(&self, id: &IncidentId) -> Result<Incident, ClientError>;

    /// `GET /api/stats`
    async fn stats(&self) -> Result<IncidentStats, ClientError>;

    /// `PUT /api/incidents/:id`
    async fn update_incident(
        &self,
        id: &IncidentId,
        update: &IncidentUpdate,
    ) -> Result<Incident, ClientError>;

    /// `PUT /api/incidents/:id/assign`
    async fn assign_incident(
        &self,
        id: &IncidentId,
        form: &AssignForm,
    ) -> Result<Incident, ClientError>;

    /// `POST /api/incidents/:id/escalate`
    async fn escalate_incident(
        &self,
        id: &IncidentId,
        form: &EscalationForm,
    ) -> Result<Incident, ClientError>;

    /// `POST /api/incidents/bulk`
    async fn bulk(&self, request: &BulkRequest) -> Result<BulkOutcome, ClientError>;

    /// `GET /api/users`
    async fn list_users(&self) -> Result<Vec<User>, ClientError>;

    /// `GET /api/stations`
    async fn list_stations(&self) -> Result<Vec<Station>, ClientError>;

    /// `GET /api/organizations`
    async fn list_organizations(&self) -> Result<Vec<Organization>, ClientError>;
}

// ──────────────────────────────────────────────
// Response envelopes
// ──────────────────────────────────────────────

/// List endpoints answer either with a bare array or with the array under
/// `data` (or the resource name).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "incidents",
            alias = "users",
            alias = "stations",
            alias = "organizations"
        )]
        data: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped { data } => data,
        }
    }
}

/// Single-record endpoints: bare object, or under `data` / `incident`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Single<T> {
    Wrapped {
        #[serde(alias = "incident")]
        data: T,
    },
    Bare(T),
}

impl<T> Single<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Single::Bare(item) => item,
            Single::Wrapped { data } => data,
        }
    }
}

/// `GET /api/stats` may also be wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StatsEnvelope {
    Wrapped { stats: IncidentStats },
    Bare(IncidentStats),
}

impl StatsEnvelope {
    pub(crate) fn into_inner(self) -> IncidentStats {
        match self {
            StatsEnvelope::Wrapped { stats } => stats,
            StatsEnvelope::Bare(stats) => stats,
        }
    }
}
