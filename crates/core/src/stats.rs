//! Dashboard counters (`GET /api/stats` shape) and their client-side
//! computation over an already scoped list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::dates::DateRange;
use crate::model::{Incident, Status};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStats {
    #[serde(default)]
    pub total: u64,
    /// Keyed by wire name (`in_progress`, `critical`, `fire`, ...).
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_priority: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub unassigned: u64,
    #[serde(default)]
    pub escalated: u64,
    #[serde(default)]
    pub resolved_today: u64,
}

impl IncidentStats {
    pub fn from_incidents<'a>(
        incidents: impl IntoIterator<Item = &'a Incident>,
        now: OffsetDateTime,
        offset: UtcOffset,
    ) -> Self {
        let mut stats = IncidentStats::default();
        for incident in incidents {
            stats.total += 1;
            *stats
                .by_status
                .entry(incident.status.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_priority
                .entry(incident.priority.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_type
                .entry(incident.incident_type.as_str().to_string())
                .or_default() += 1;

            if incident.is_unassigned() && !incident.status.is_terminal() {
                stats.unassigned += 1;
            }
            if incident.status == Status::Escalated {
                stats.escalated += 1;
            }
            let resolved_today = incident
                .resolved_at
                .is_some_and(|at| DateRange::Today.contains(at, now, offset));
            if incident.status == Status::Resolved && resolved_today {
                stats.resolved_today += 1;
            }
        }
        stats
    }

    pub fn count_status(&self, status: Status) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Incidents not yet resolved or closed.
    pub fn open(&self) -> u64 {
        Status::ALL
            .iter()
            .filter(|s| !s.is_terminal())
            .map(|s| self.count_status(*s))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{assigned_to, incident, with_priority, with_status};
    use crate::model::Priority;
    use time::macros::datetime;

    #[test]
    fn counts_scoped_list() {
        let now = datetime!(2025-03-10 12:00 UTC);
        let mut done = assigned_to(with_status(incident("3", "s", "o"), Status::Resolved), "u");
        done.resolved_at = Some(datetime!(2025-03-10 09:00 UTC));
        let mut old = assigned_to(with_status(incident("4", "s", "o"), Status::Resolved), "u");
        old.resolved_at = Some(datetime!(2025-03-01 09:00 UTC));

        let data = vec![
            with_priority(incident("1", "s", "o"), Priority::Critical),
            assigned_to(with_status(incident("2", "s", "o"), Status::Escalated), "u"),
            done,
            old,
        ];
        let stats = IncidentStats::from_incidents(&data, now, UtcOffset::UTC);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.unassigned, 1);
        assert_eq!(stats.escalated, 1);
        assert_eq!(stats.resolved_today, 1);
        assert_eq!(stats.count_status(Status::Resolved), 2);
        assert_eq!(stats.by_priority.get("critical"), Some(&1));
        assert_eq!(stats.open(), 2);
    }

    #[test]
    fn deserializes_partial_backend_payload() {
        let stats: IncidentStats = serde_json::from_value(serde_json::json!({
            "total": 12,
            "byStatus": { "reported": 5, "resolved": 7 }
        }))
        .unwrap();
        assert_eq!(stats.total, 12);
        assert_eq!(stats.open(), 5);
        assert_eq!(stats.escalated, 0);
    }
}
