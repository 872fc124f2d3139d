//! Action menu: which workflow actions a user is offered on one incident.
//!
//! Pure function of (role, status, ownership). Nothing here talks to the
//! backend; performing an action is the client's job, and the backend may
//! still refuse it.

use serde::Serialize;

use crate::model::{Incident, Role, Status, User, UserId};
use crate::workflow::Transition;

wire_enum!(
    /// Menu entries, in the order menus list them.
    IncidentAction, "action" {
        TakeCase => "take_case",
        StartWorking => "start_working",
        MarkResolved => "mark_resolved",
        Escalate => "escalate",
        AssignStaff => "assign_staff",
        AssignOrganization => "assign_organization",
        Resolve => "resolve",
        Reassign => "reassign",
        ViewDetails => "view_details",
        EditIncident => "edit_incident",
    }
);

impl IncidentAction {
    pub fn label(self) -> &'static str {
        match self {
            IncidentAction::TakeCase => "Take Case",
            IncidentAction::StartWorking => "Start Working",
            IncidentAction::MarkResolved => "Mark Resolved",
            IncidentAction::Escalate => "Escalate",
            IncidentAction::AssignStaff => "Assign Staff",
            IncidentAction::AssignOrganization => "Assign (org-wide)",
            IncidentAction::Resolve => "Resolve",
            IncidentAction::Reassign => "Reassign",
            IncidentAction::ViewDetails => "View Details",
            IncidentAction::EditIncident => "Edit Incident",
        }
    }

    pub fn transition(self) -> Transition {
        match self {
            IncidentAction::TakeCase => Transition::AssignToSelf,
            IncidentAction::StartWorking => Transition::SetStatus(Status::InProgress),
            IncidentAction::MarkResolved | IncidentAction::Resolve => {
                Transition::SetStatus(Status::Resolved)
            }
            IncidentAction::Escalate => Transition::Escalate,
            IncidentAction::AssignStaff => Transition::AssignStaff,
            IncidentAction::AssignOrganization => Transition::AssignOrganization,
            IncidentAction::Reassign => Transition::Reassign,
            IncidentAction::ViewDetails | IncidentAction::EditIncident => Transition::None,
        }
    }
}

/// Who holds the incident, relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Unassigned,
    Mine,
    Others,
}

impl Ownership {
    pub fn of(incident: &Incident, viewer: &UserId) -> Self {
        match &incident.assigned_to_id {
            None => Ownership::Unassigned,
            Some(id) if id == viewer => Ownership::Mine,
            Some(_) => Ownership::Others,
        }
    }
}

/// The decision table. First matching row wins.
fn menu_for(role: Role, status: Status, ownership: Ownership) -> &'static [IncidentAction] {
    use IncidentAction::*;

    match (role, status, ownership) {
        (Role::Citizen, _, _) => &[],

        (Role::StationStaff, Status::Reported, Ownership::Unassigned) => &[TakeCase, ViewDetails],
        (Role::StationStaff, Status::Assigned, Ownership::Mine) => &[StartWorking, ViewDetails],
        (Role::StationStaff, Status::InProgress, Ownership::Mine) => {
            &[MarkResolved, Escalate, ViewDetails]
        }
        (Role::StationStaff, _, _) => &[ViewDetails],

        (Role::StationAdmin, _, Ownership::Unassigned) => {
            &[TakeCase, AssignStaff, ViewDetails, EditIncident]
        }
        (Role::StationAdmin, _, _) => &[TakeCase, ViewDetails, EditIncident],

        (Role::SuperAdmin | Role::MainAdmin, _, _) => {
            &[TakeCase, AssignOrganization, Resolve, Escalate, Reassign]
        }
    }
}

/// Actions offered to `user` on `incident`, in display order.
///
/// Terminal incidents (resolved, closed) keep only the entries that do not
/// request a transition.
pub fn available_actions(incident: &Incident, user: &User) -> Vec<IncidentAction> {
    let ownership = Ownership::of(incident, &user.id);
    let terminal = incident.status.is_terminal();
    menu_for(user.role, incident.status, ownership)
        .iter()
        .copied()
        .filter(|a| !terminal || !a.transition().is_mutation())
        .collect()
}

pub fn is_permitted(incident: &Incident, user: &User, action: IncidentAction) -> bool {
    available_actions(incident, user).contains(&action)
}

/// Serializable menu row for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub action: IncidentAction,
    pub label: &'static str,
    pub transition: Transition,
}

impl From<IncidentAction> for MenuEntry {
    fn from(action: IncidentAction) -> Self {
        MenuEntry {
            action,
            label: action.label(),
            transition: action.transition(),
        }
    }
}

pub fn menu_entries(incident: &Incident, user: &User) -> Vec<MenuEntry> {
    available_actions(incident, user)
        .into_iter()
        .map(MenuEntry::from)
        .collect()
}
