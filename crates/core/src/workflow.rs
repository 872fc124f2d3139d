//! Incident status state machine.
//!
//! ```text
//! reported ─┐
//!           ├─> assigned ─> in_progress ─┬─> resolved
//! pending ──┘                   ^        └─> escalated
//!                               └────────────────┘
//! ```
//!
//! `resolved` and `closed` are terminal. Any open status may be closed by an
//! administrator edit. The client only ever *requests* transitions; the
//! backend decides.

use serde::{Deserialize, Serialize};

use crate::model::Status;

impl Status {
    /// No further transitions are offered once an incident reaches here.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Resolved | Status::Closed)
    }

    /// Statuses reachable from `self` in one step.
    pub fn successors(self) -> &'static [Status] {
        match self {
            Status::Reported | Status::Pending => &[Status::Assigned, Status::Closed],
            Status::Assigned => &[Status::InProgress, Status::Closed],
            Status::InProgress => &[Status::Resolved, Status::Escalated, Status::Closed],
            Status::Escalated => &[Status::InProgress, Status::Closed],
            Status::Resolved | Status::Closed => &[],
        }
    }

    /// Advisory client-side check. Staying in the same status is always fine.
    pub fn can_transition_to(self, next: Status) -> bool {
        self == next || self.successors().contains(&next)
    }
}

/// What an action asks the backend to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum Transition {
    /// `PUT /api/incidents/:id` with a new status.
    SetStatus(Status),
    /// `PUT /api/incidents/:id/assign` to the acting user.
    AssignToSelf,
    /// Assign to a member of the incident's station.
    AssignStaff,
    /// Assign to anyone in the organization.
    AssignOrganization,
    /// Replace the current assignee.
    Reassign,
    /// `POST /api/incidents/:id/escalate`.
    Escalate,
    /// Navigation only (view, open the edit form).
    None,
}

impl Transition {
    /// True if performing the transition changes status or ownership.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Transition::None)
    }

    /// Status the incident is expected to hold once the backend confirms.
    /// `None` for assignment-only changes where the backend picks.
    pub fn target_status(self) -> Option<Status> {
        match self {
            Transition::SetStatus(s) => Some(s),
            Transition::Escalate => Some(Status::Escalated),
            Transition::AssignToSelf | Transition::AssignStaff | Transition::AssignOrganization => {
                Some(Status::Assigned)
            }
            Transition::Reassign | Transition::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_permitted() {
        assert!(Status::Reported.can_transition_to(Status::Assigned));
        assert!(Status::Assigned.can_transition_to(Status::InProgress));
        assert!(Status::InProgress.can_transition_to(Status::Resolved));
        assert!(Status::InProgress.can_transition_to(Status::Escalated));
    }

    #[test]
    fn escalated_can_reenter_in_progress() {
        assert!(Status::Escalated.can_transition_to(Status::InProgress));
        assert!(!Status::Escalated.can_transition_to(Status::Resolved));
    }

    #[test]
    fn terminal_statuses_have_no_successors() {
        for status in [Status::Resolved, Status::Closed] {
            assert!(status.is_terminal());
            assert!(status.successors().is_empty());
            assert!(!status.can_transition_to(Status::InProgress));
        }
    }

    #[test]
    fn skipping_steps_is_not_permitted() {
        assert!(!Status::Reported.can_transition_to(Status::InProgress));
        assert!(!Status::Assigned.can_transition_to(Status::Resolved));
    }

    #[test]
    fn every_successor_is_a_real_move() {
        for status in Status::ALL {
            for next in status.successors() {
                assert_ne!(status, next);
            }
        }
    }

    #[test]
    fn transition_targets() {
        assert_eq!(Transition::Escalate.target_status(), Some(Status::Escalated));
        assert_eq!(
            Transition::SetStatus(Status::Resolved).target_status(),
            Some(Status::Resolved)
        );
        assert!(!Transition::None.is_mutation());
    }
}
