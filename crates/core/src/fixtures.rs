//! Record builders shared by the unit tests.

use time::macros::datetime;
use time::OffsetDateTime;

use crate::model::{
    Incident, IncidentId, IncidentType, Location, OrganizationId, Priority, Role, StationId,
    Status, User, UserId,
};

pub(crate) fn incident(id: &str, station: &str, org: &str) -> Incident {
    Incident {
        id: IncidentId::from(id),
        incident_type: IncidentType::Other,
        priority: Priority::Medium,
        status: Status::Reported,
        title: format!("incident {id}"),
        description: String::new(),
        location: Location::default(),
        notes: None,
        station_id: Some(StationId::from(station)),
        organization_id: Some(OrganizationId::from(org)),
        assigned_to_id: None,
        reported_by_id: None,
        reporter_info: None,
        upvote_count: 0,
        created_at: datetime!(2025-03-01 08:00 UTC),
        updated_at: datetime!(2025-03-01 08:00 UTC),
        resolved_at: None,
        escalated_at: None,
        escalation_reason: None,
        escalation_level: 0,
    }
}

pub(crate) fn user(id: &str, role: Role, station: Option<&str>, org: Option<&str>) -> User {
    User {
        id: UserId::from(id),
        name: format!("user {id}"),
        email: format!("{id}@example.org"),
        role,
        station_id: station.map(StationId::from),
        organization_id: org.map(OrganizationId::from),
    }
}

pub(crate) fn with_priority(mut i: Incident, priority: Priority) -> Incident {
    i.priority = priority;
    i
}

pub(crate) fn with_status(mut i: Incident, status: Status) -> Incident {
    i.status = status;
    i
}

pub(crate) fn assigned_to(mut i: Incident, user: &str) -> Incident {
    i.assigned_to_id = Some(UserId::from(user));
    i
}

pub(crate) fn created(mut i: Incident, at: OffsetDateTime) -> Incident {
    i.created_at = at;
    i.updated_at = at;
    i
}
