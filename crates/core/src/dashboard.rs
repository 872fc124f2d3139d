//! The full list-view derivation: scope → filter → sort → action menu.
//!
//! Recomputed from scratch on every data refresh. Nothing is cached here.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::actions::{available_actions, IncidentAction};
use crate::filter::{apply_filters, FilterContext, FilterCriteria};
use crate::model::{Incident, User};
use crate::scope::scope_incidents;
use crate::sort::{sort_incidents, SortState};

/// What the user asked the table to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub criteria: FilterCriteria,
    #[serde(default)]
    pub sort: SortState,
}

/// One table row with the menu the viewer gets for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow<'a> {
    pub incident: &'a Incident,
    pub actions: Vec<IncidentAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "rows", rename_all = "snake_case")]
pub enum DashboardView<'a> {
    /// No authenticated user; render the sign-in prompt instead of a table.
    LoginRequired,
    /// Authenticated, but nothing in scope survived the filters.
    Empty,
    Rows(Vec<DashboardRow<'a>>),
}

impl<'a> DashboardView<'a> {
    pub fn rows(&self) -> &[DashboardRow<'a>] {
        match self {
            DashboardView::Rows(rows) => rows,
            DashboardView::LoginRequired | DashboardView::Empty => &[],
        }
    }
}

/// Derive the table for `user`. The signed-out case short-circuits before
/// any scoping or filtering happens.
pub fn build_view<'a>(
    incidents: &'a [Incident],
    user: Option<&User>,
    query: &DashboardQuery,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> DashboardView<'a> {
    let Some(user) = user else {
        return DashboardView::LoginRequired;
    };

    // 1. Role scope
    let scoped = scope_incidents(incidents, user);

    // 2. User criteria
    let ctx = FilterContext::new(Some(&user.id), now, offset);
    let mut visible = apply_filters(&scoped, &query.criteria, &ctx);
    if visible.is_empty() {
        return DashboardView::Empty;
    }

    // 3. Order
    sort_incidents(&mut visible, query.sort);

    // 4. Per-row menus
    DashboardView::Rows(
        visible
            .into_iter()
            .map(|incident| DashboardRow {
                incident,
                actions: available_actions(incident, user),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AssigneeFilter;
    use crate::fixtures::{assigned_to, incident, user, with_priority, with_status};
    use crate::model::{Priority, Role, Status};
    use crate::sort::{SortDirection, SortField};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-03-10 12:00 UTC);

    fn data() -> Vec<Incident> {
        vec![
            with_priority(incident("1", "s1", "o1"), Priority::Low),
            assigned_to(
                with_priority(with_status(incident("2", "s1", "o1"), Status::InProgress), Priority::Critical),
                "me",
            ),
            with_priority(incident("3", "s2", "o1"), Priority::High),
        ]
    }

    #[test]
    fn signed_out_viewer_gets_login_prompt() {
        let list = data();
        let view = build_view(&list, None, &DashboardQuery::default(), NOW, UtcOffset::UTC);
        assert_eq!(view, DashboardView::LoginRequired);
        assert!(view.rows().is_empty());
    }

    #[test]
    fn staff_view_is_scoped_sorted_and_menued() {
        let list = data();
        let me = user("me", Role::StationStaff, Some("s1"), Some("o1"));
        let query = DashboardQuery {
            sort: SortState::new(SortField::Priority, SortDirection::Descending),
            ..DashboardQuery::default()
        };
        let view = build_view(&list, Some(&me), &query, NOW, UtcOffset::UTC);
        let rows = view.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].incident.id.as_str(), "2");
        assert_eq!(
            rows[0].actions,
            [
                IncidentAction::MarkResolved,
                IncidentAction::Escalate,
                IncidentAction::ViewDetails
            ]
        );
        assert_eq!(rows[1].actions, [IncidentAction::TakeCase, IncidentAction::ViewDetails]);
    }

    #[test]
    fn nothing_matching_is_empty_state() {
        let list = data();
        let citizen = user("c", Role::Citizen, None, None);
        let query = DashboardQuery {
            criteria: FilterCriteria::default().with_assignee(AssigneeFilter::Me),
            ..DashboardQuery::default()
        };
        let view = build_view(&list, Some(&citizen), &query, NOW, UtcOffset::UTC);
        assert_eq!(view, DashboardView::Empty);
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let list = data();
        let citizen = user("c", Role::Citizen, None, None);
        let view = build_view(&list, Some(&citizen), &DashboardQuery::default(), NOW, UtcOffset::UTC);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "rows");
        assert_eq!(json["rows"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["rows"][0]["actions"], serde_json::json!([]));
    }
}
