//! Mutation forms and the client-side checks that run before any request
//! is sent. A form that fails here never reaches the network.
//!
//! The structs double as the JSON request bodies (camelCase on the wire).

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::model::{Incident, IncidentId, Priority, Status, UserId};

/// Longest escalation reason the backend accepts.
pub const MAX_REASON_LEN: usize = 1000;

/// `POST /api/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.push("email", "email is required");
        } else if !email.contains('@') {
            errors.push("email", "email must be a valid address");
        }
        if self.password.is_empty() {
            errors.push("password", "password is required");
        }
        errors.into_result()
    }
}

/// `PUT /api/incidents/:id/assign`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignForm {
    pub assigned_to_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AssignForm {
    pub fn to(user: UserId) -> Self {
        AssignForm {
            assigned_to_id: Some(user),
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.assigned_to_id {
            Some(id) if !id.as_str().trim().is_empty() => {}
            _ => errors.push("assignedToId", "select a staff member to assign"),
        }
        errors.into_result()
    }
}

/// `POST /api/incidents/:id/escalate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationForm {
    pub reason: String,
}

impl EscalationForm {
    pub fn new(reason: impl Into<String>) -> Self {
        EscalationForm {
            reason: reason.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let reason = self.reason.trim();
        if reason.is_empty() {
            errors.push("reason", "an escalation reason is required");
        } else if reason.chars().count() > MAX_REASON_LEN {
            errors.push(
                "reason",
                format!("reason must be at most {} characters", MAX_REASON_LEN),
            );
        }
        errors.into_result()
    }
}

/// `PUT /api/incidents/:id`. Only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IncidentUpdate {
    pub fn status(status: Status) -> Self {
        IncidentUpdate {
            status: Some(status),
            ..IncidentUpdate::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
    }

    /// Checked against the incident as last fetched.
    pub fn validate(&self, current: &Incident) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.is_empty() {
            errors.push("incident", "nothing to update");
        }
        if let Some(next) = self.status {
            if !current.status.can_transition_to(next) {
                errors.push(
                    "status",
                    format!("cannot move from {} to {}", current.status, next),
                );
            }
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                errors.push("title", "title cannot be blank");
            }
        }
        errors.into_result()
    }
}

wire_enum!(
    /// Operations accepted by `POST /api/incidents/bulk`.
    BulkAction, "bulk action" {
        Assign => "assign",
        UpdateStatus => "update_status",
        UpdatePriority => "update_priority",
        Export => "export",
    }
);

/// `POST /api/incidents/bulk` body: `{action, incidentIds, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub action: BulkAction,
    pub incident_ids: Vec<IncidentId>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl BulkRequest {
    pub fn new(action: BulkAction, incident_ids: Vec<IncidentId>) -> Self {
        BulkRequest {
            action,
            incident_ids,
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        if !self.data.is_object() {
            self.data = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.data.as_object_mut() {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.incident_ids.is_empty() {
            errors.push("incidentIds", "select at least one incident");
        }
        let field = |name| data_str(&self.data, name);
        match self.action {
            BulkAction::Assign => {
                if field("assignedToId").map_or(true, |s| s.trim().is_empty()) {
                    errors.push("assignedToId", "select a staff member to assign");
                }
            }
            BulkAction::UpdateStatus => {
                if field("status").and_then(|s| s.parse::<Status>().ok()).is_none() {
                    errors.push("status", "choose a valid status");
                }
            }
            BulkAction::UpdatePriority => {
                if field("priority")
                    .and_then(|s| s.parse::<Priority>().ok())
                    .is_none()
                {
                    errors.push("priority", "choose a valid priority");
                }
            }
            BulkAction::Export => {}
        }
        errors.into_result()
    }
}

fn data_str<'a>(data: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(|v| v.as_str())
}
