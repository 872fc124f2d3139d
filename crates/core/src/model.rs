//! Wire model shared by every view: incidents, users, stations, organizations.
//!
//! One schema is authoritative. Identifiers are normalized to strings on the
//! way in (the backend has served both numeric and UUID ids), the location is
//! always the nested `location.address` object, and timestamps are RFC 3339.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

// ──────────────────────────────────────────────
// Identifiers
// ──────────────────────────────────────────────

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Signed(i64),
                    Unsigned(u64),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Text(s) => Self(s),
                    Raw::Signed(n) => Self(n.to_string()),
                    Raw::Unsigned(n) => Self(n.to_string()),
                })
            }
        }
    };
}

string_id!(
    /// Backend-assigned incident identifier.
    IncidentId
);
string_id!(
    /// Backend-assigned user identifier.
    UserId
);
string_id!(StationId);
string_id!(OrganizationId);

// ──────────────────────────────────────────────
// Closed enums
// ──────────────────────────────────────────────

/// Declares a closed snake_case wire enum with `as_str`, `ALL`, `Display`
/// and `FromStr`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| $crate::error::ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

wire_enum!(
    /// What kind of responder the incident needs.
    IncidentType, "incident type" {
        Police => "police",
        Medical => "medical",
        Fire => "fire",
        Other => "other",
    }
);

wire_enum!(
    /// Urgency. Declaration order is the ordinal order, so the derived
    /// `Ord` never compares names lexically.
    #[derive(PartialOrd, Ord)]
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

wire_enum!(
    /// Workflow status. See [`crate::workflow`] for the permitted transitions.
    Status, "status" {
        Reported => "reported",
        Pending => "pending",
        Assigned => "assigned",
        InProgress => "in_progress",
        Resolved => "resolved",
        Escalated => "escalated",
        Closed => "closed",
    }
);

wire_enum!(
    /// Account role. Decides both the visibility scope and the action menu.
    Role, "role" {
        Citizen => "citizen",
        StationStaff => "station_staff",
        StationAdmin => "station_admin",
        SuperAdmin => "super_admin",
        MainAdmin => "main_admin",
    }
);

impl Priority {
    /// 1 (low) through 4 (critical).
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Critical => 4,
        }
    }
}

impl Status {
    /// Position along the happy path; used to sort by status.
    pub fn workflow_rank(self) -> u8 {
        match self {
            Status::Reported => 0,
            Status::Pending => 1,
            Status::Assigned => 2,
            Status::InProgress => 3,
            Status::Escalated => 4,
            Status::Resolved => 5,
            Status::Closed => 6,
        }
    }
}

impl Role {
    /// Roles that belong to a single station.
    pub fn is_station_role(self) -> bool {
        matches!(self, Role::StationStaff | Role::StationAdmin)
    }

    pub fn is_admin(self) -> bool {
        matches!(
            self,
            Role::StationAdmin | Role::SuperAdmin | Role::MainAdmin
        )
    }
}

// ──────────────────────────────────────────────
// Records
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// Contact details left by the reporter. Every field is optional because
/// anonymous reports are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReporterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A reported emergency tracked through the status workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub priority: Priority,
    pub status: Status,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<StationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub assigned_to_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_info: Option<ReporterInfo>,
    #[serde(default)]
    pub upvote_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub escalated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    #[serde(default)]
    pub escalation_level: u32,
}

impl Incident {
    /// Human-facing reference: `INC-` plus the id left-padded with zeros to
    /// four characters. Longer ids are kept whole.
    pub fn display_id(&self) -> String {
        format!("INC-{:0>4}", self.id.as_str())
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_to_id.is_none()
    }

    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.assigned_to_id.as_ref() == Some(user)
    }

    pub fn is_anonymous(&self) -> bool {
        self.reported_by_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<StationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: StationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn incident_json(id: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "fire",
            "priority": "high",
            "status": "in_progress",
            "title": "Kitchen fire",
            "description": "Smoke from second floor",
            "location": { "address": "12 Harbour Rd", "lat": -6.8, "lng": 39.28 },
            "stationId": 7,
            "organizationId": "org-1",
            "assignedToId": 42,
            "upvoteCount": 3,
            "createdAt": "2025-03-01T08:30:00Z",
            "updatedAt": "2025-03-01T09:00:00+03:00",
            "escalationLevel": 1
        })
    }

    #[test]
    fn numeric_and_string_ids_normalize_to_strings() {
        let a: Incident = serde_json::from_value(incident_json(serde_json::json!(42))).unwrap();
        let b: Incident =
            serde_json::from_value(incident_json(serde_json::json!("42"))).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.station_id, Some(StationId::from("7")));
        assert!(a.is_assigned_to(&UserId::from("42")));
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let incident: Incident =
            serde_json::from_value(incident_json(serde_json::json!("abc"))).unwrap();
        assert_eq!(incident.resolved_at, None);
        assert_eq!(incident.notes, None);
        assert!(incident.is_anonymous());
        assert_eq!(incident.escalation_level, 1);
    }

    #[test]
    fn null_assignee_is_unassigned() {
        let mut json = incident_json(serde_json::json!(1));
        json["assignedToId"] = serde_json::Value::Null;
        let incident: Incident = serde_json::from_value(json).unwrap();
        assert!(incident.is_unassigned());
    }

    #[test]
    fn serializes_back_to_camel_case() {
        let incident: Incident =
            serde_json::from_value(incident_json(serde_json::json!(5))).unwrap();
        let value = serde_json::to_value(&incident).unwrap();
        assert_eq!(value["type"], "fire");
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["assignedToId"], "42");
        assert_eq!(value["location"]["address"], "12 Harbour Rd");
        assert!(value.get("resolvedAt").is_none());
    }

    #[test]
    fn display_id_pads_to_four() {
        let mut incident: Incident =
            serde_json::from_value(incident_json(serde_json::json!(42))).unwrap();
        assert_eq!(incident.display_id(), "INC-0042");
        incident.id = IncidentId::from("12345");
        assert_eq!(incident.display_id(), "INC-12345");
    }

    #[test]
    fn priority_order_is_ordinal_not_lexical() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::Critical.rank(), 4);
    }

    #[test]
    fn enums_parse_from_cli_spellings() {
        assert_eq!("in-progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("STATION_ADMIN".parse::<Role>(), Ok(Role::StationAdmin));
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.kind, "priority");
        assert!(err.to_string().contains("critical"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut json = incident_json(serde_json::json!(1));
        json["status"] = serde_json::json!("archived");
        assert!(serde_json::from_value::<Incident>(json).is_err());
    }
}
