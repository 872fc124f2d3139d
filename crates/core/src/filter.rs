//! Search / filter predicate for incident lists.
//!
//! Every criterion is optional and they combine with AND. Blank strings and
//! empty sets are no-ops, so `FilterCriteria::default()` keeps everything.
//! The predicate is a pure function of (incident, criteria, context), which
//! makes applying it idempotent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::dates::DateRange;
use crate::model::{Incident, IncidentType, Priority, Status, UserId};

wire_enum!(
    /// Ownership filter.
    AssigneeFilter, "assignee filter" {
        Me => "me",
        Unassigned => "unassigned",
        Anyone => "anyone",
    }
);

impl Default for AssigneeFilter {
    fn default() -> Self {
        AssigneeFilter::Anyone
    }
}

/// User-chosen criteria from the search bar and the advanced search panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub status: BTreeSet<StatusKey>,
    #[serde(default)]
    pub priority: BTreeSet<PriorityKey>,
    #[serde(default, rename = "type")]
    pub incident_type: BTreeSet<TypeKey>,
    #[serde(default)]
    pub assigned_to: AssigneeFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

// The wire enums are `Hash` but not `Ord` (except `Priority`); sets are kept
// ordered by wire name so criteria serialize deterministically.
macro_rules! ordered_key {
    ($key:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $key(pub $inner);

        impl PartialOrd for $key {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $key {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.as_str().cmp(other.0.as_str())
            }
        }

        impl From<$inner> for $key {
            fn from(v: $inner) -> Self {
                $key(v)
            }
        }
    };
}

ordered_key!(StatusKey, Status);
ordered_key!(PriorityKey, Priority);
ordered_key!(TypeKey, IncidentType);

/// Viewer-dependent inputs: who "me" is, the clock, and the display offset.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub current_user: Option<&'a UserId>,
    pub now: OffsetDateTime,
    pub offset: UtcOffset,
}

impl<'a> FilterContext<'a> {
    pub fn new(current_user: Option<&'a UserId>, now: OffsetDateTime, offset: UtcOffset) -> Self {
        FilterContext {
            current_user,
            now,
            offset,
        }
    }
}

impl FilterCriteria {
    pub fn with_search(mut self, text: &str) -> Self {
        self.search = Some(text.to_string());
        self
    }

    pub fn with_status(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.status.extend(statuses.into_iter().map(StatusKey));
        self
    }

    pub fn with_priority(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priority.extend(priorities.into_iter().map(PriorityKey));
        self
    }

    pub fn with_type(mut self, types: impl IntoIterator<Item = IncidentType>) -> Self {
        self.incident_type.extend(types.into_iter().map(TypeKey));
        self
    }

    pub fn with_assignee(mut self, assignee: AssigneeFilter) -> Self {
        self.assigned_to = assignee;
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Number of criteria that actually restrict the list (the badge on the
    /// advanced-search toggle).
    pub fn active_count(&self) -> usize {
        [
            non_blank(&self.search).is_some(),
            !self.status.is_empty(),
            !self.priority.is_empty(),
            !self.incident_type.is_empty(),
            self.assigned_to != AssigneeFilter::Anyone,
            non_blank(&self.location).is_some(),
            non_blank(&self.incident_id).is_some(),
            self.date_range.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// The per-record predicate.
    pub fn matches(&self, incident: &Incident, ctx: &FilterContext<'_>) -> bool {
        if let Some(text) = non_blank(&self.search) {
            let needle = text.to_lowercase();
            let haystacks = [
                incident.title.as_str(),
                incident.description.as_str(),
                incident.location.address.as_str(),
                incident.notes.as_deref().unwrap_or(""),
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
                return false;
            }
        }

        if !self.status.is_empty() && !self.status.contains(&StatusKey(incident.status)) {
            return false;
        }
        if !self.priority.is_empty() && !self.priority.contains(&PriorityKey(incident.priority)) {
            return false;
        }
        if !self.incident_type.is_empty()
            && !self.incident_type.contains(&TypeKey(incident.incident_type))
        {
            return false;
        }

        match self.assigned_to {
            AssigneeFilter::Anyone => {}
            AssigneeFilter::Unassigned => {
                if !incident.is_unassigned() {
                    return false;
                }
            }
            AssigneeFilter::Me => match ctx.current_user {
                Some(me) if incident.is_assigned_to(me) => {}
                _ => return false,
            },
        }

        if let Some(place) = non_blank(&self.location) {
            if !incident
                .location
                .address
                .to_lowercase()
                .contains(&place.to_lowercase())
            {
                return false;
            }
        }

        if let Some(id) = non_blank(&self.incident_id) {
            let needle = id.to_lowercase();
            let raw = incident.id.as_str().to_lowercase();
            let display = incident.display_id().to_lowercase();
            if !raw.contains(&needle) && !display.contains(&needle) {
                return false;
            }
        }

        if let Some(range) = self.date_range {
            if !range.contains(incident.created_at, ctx.now, ctx.offset) {
                return false;
            }
        }

        true
    }
}

/// Keep the incidents matching `criteria`, preserving their relative order.
pub fn apply_filters<'a>(
    incidents: &[&'a Incident],
    criteria: &FilterCriteria,
    ctx: &FilterContext<'_>,
) -> Vec<&'a Incident> {
    incidents
        .iter()
        .copied()
        .filter(|i| criteria.matches(i, ctx))
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{assigned_to, created, incident, with_priority, with_status};
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2025-03-10 12:00 UTC);

    fn ctx(user: Option<&UserId>) -> FilterContext<'_> {
        FilterContext::new(user, NOW, UtcOffset::UTC)
    }

    fn sample() -> Vec<Incident> {
        let mut a = incident("1", "s1", "o1");
        a.title = "House fire on Main St".into();
        a.location.address = "14 Main Street".into();
        a.incident_type = IncidentType::Fire;
        let a = created(with_priority(a, Priority::Critical), NOW - Duration::hours(2));

        let mut b = incident("2", "s1", "o1");
        b.title = "Stolen bicycle".into();
        b.notes = Some("Suspect fled toward the MARKET".into());
        b.incident_type = IncidentType::Police;
        let b = created(assigned_to(with_status(b, Status::Resolved), "u1"), NOW - Duration::days(3));

        let mut c = incident("123", "s1", "o1");
        c.title = "Collapsed runner".into();
        c.description = "Marathon route, km 30".into();
        c.incident_type = IncidentType::Medical;
        let c = created(
            assigned_to(with_status(c, Status::InProgress), "u2"),
            NOW - Duration::days(20),
        );

        vec![a, b, c]
    }

    fn ids(list: &[&Incident]) -> Vec<String> {
        list.iter().map(|i| i.id.to_string()).collect()
    }

    fn run(criteria: &FilterCriteria, user: Option<&UserId>) -> Vec<String> {
        let data = sample();
        let refs: Vec<&Incident> = data.iter().collect();
        ids(&apply_filters(&refs, criteria, &ctx(user)))
    }

    #[test]
    fn default_criteria_keep_everything_in_order() {
        assert_eq!(run(&FilterCriteria::default(), None), ["1", "2", "123"]);
        assert!(FilterCriteria::default().is_empty());
    }

    #[test]
    fn status_filter_selects_exactly_the_resolved_record() {
        let criteria = FilterCriteria::default().with_status([Status::Resolved]);
        assert_eq!(run(&criteria, None), ["2"]);
    }

    #[test]
    fn search_is_case_insensitive_over_text_fields() {
        assert_eq!(run(&FilterCriteria::default().with_search("MAIN"), None), ["1"]);
        assert_eq!(run(&FilterCriteria::default().with_search("market"), None), ["2"]);
        assert_eq!(run(&FilterCriteria::default().with_search("marathon"), None), ["123"]);
        assert!(run(&FilterCriteria::default().with_search("volcano"), None).is_empty());
    }

    #[test]
    fn blank_strings_are_no_ops() {
        let criteria = FilterCriteria {
            search: Some("   ".into()),
            location: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert_eq!(run(&criteria, None).len(), 3);
        assert_eq!(criteria.active_count(), 0);
    }

    #[test]
    fn sets_are_ored_within_and_anded_across() {
        let criteria = FilterCriteria::default()
            .with_type([IncidentType::Fire, IncidentType::Medical])
            .with_priority([Priority::Medium]);
        assert_eq!(run(&criteria, None), ["123"]);
        assert_eq!(criteria.active_count(), 2);
    }

    #[test]
    fn assignee_filters() {
        let me = UserId::from("u1");
        let mine = FilterCriteria::default().with_assignee(AssigneeFilter::Me);
        assert_eq!(run(&mine, Some(&me)), ["2"]);
        assert!(run(&mine, None).is_empty());
        let open = FilterCriteria::default().with_assignee(AssigneeFilter::Unassigned);
        assert_eq!(run(&open, Some(&me)), ["1"]);
    }

    #[test]
    fn incident_id_matches_raw_or_display_form() {
        let by_display = FilterCriteria {
            incident_id: Some("inc-0123".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(run(&by_display, None), ["123"]);
        let by_raw = FilterCriteria {
            incident_id: Some("2".into()),
            ..FilterCriteria::default()
        };
        // "2" is in "2" and in "123".
        assert_eq!(run(&by_raw, None), ["2", "123"]);
    }

    #[test]
    fn location_filter() {
        let criteria = FilterCriteria {
            location: Some("main street".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(run(&criteria, None), ["1"]);
    }

    #[test]
    fn date_ranges() {
        let today = FilterCriteria::default().with_date_range(DateRange::Today);
        assert_eq!(run(&today, None), ["1"]);
        let week = FilterCriteria::default().with_date_range(DateRange::Week);
        assert_eq!(run(&week, None), ["1", "2"]);
        let month = FilterCriteria::default().with_date_range(DateRange::Month);
        assert_eq!(run(&month, None).len(), 3);
    }

    #[test]
    fn filtering_is_idempotent() {
        let data = sample();
        let refs: Vec<&Incident> = data.iter().collect();
        let me = UserId::from("u2");
        let criteria_list = [
            FilterCriteria::default(),
            FilterCriteria::default().with_search("r"),
            FilterCriteria::default().with_status([Status::InProgress, Status::Reported]),
            FilterCriteria::default()
                .with_assignee(AssigneeFilter::Me)
                .with_date_range(DateRange::Month),
        ];
        for criteria in &criteria_list {
            let once = apply_filters(&refs, criteria, &ctx(Some(&me)));
            let twice = apply_filters(&once, criteria, &ctx(Some(&me)));
            assert_eq!(ids(&once), ids(&twice));
        }
    }

    #[test]
    fn criteria_deserialize_from_camel_case() {
        let criteria: FilterCriteria = serde_json::from_value(serde_json::json!({
            "status": ["resolved", "in_progress"],
            "type": ["fire"],
            "assignedTo": "unassigned",
            "dateRange": "week"
        }))
        .unwrap();
        assert_eq!(criteria.status.len(), 2);
        assert_eq!(criteria.assigned_to, AssigneeFilter::Unassigned);
        assert_eq!(criteria.date_range, Some(DateRange::Week));
        assert_eq!(criteria.active_count(), 4);
    }
}
