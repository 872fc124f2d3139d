//! Plain-text rendering for terminal output. JSON output bypasses this
//! module and serializes the core types directly.

use std::fmt::Write as _;

use time::{OffsetDateTime, UtcOffset};

use dispatch_core::dates::{format_date_time, format_relative};
use dispatch_core::{
    DashboardRow, Incident, IncidentAction, IncidentStats, Organization, Priority, Station,
    Status, User, UserId,
};

const TITLE_WIDTH: usize = 36;
const ADDRESS_WIDTH: usize = 26;

/// Cut `text` to `width` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

fn assignee(incident: &Incident, viewer: Option<&UserId>) -> String {
    match &incident.assigned_to_id {
        None => "-".to_string(),
        Some(id) if Some(id) == viewer => "you".to_string(),
        Some(id) => id.to_string(),
    }
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "!!",
        Priority::High => "! ",
        Priority::Medium | Priority::Low => "  ",
    }
}

pub(crate) fn incident_table(
    rows: &[DashboardRow<'_>],
    viewer: Option<&UserId>,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<11} {:<12} {:<8} {:<title$} {:<addr$} {:<10} {}",
        "ID",
        "PRIORITY",
        "STATUS",
        "TYPE",
        "TITLE",
        "LOCATION",
        "ASSIGNEE",
        "CREATED",
        title = TITLE_WIDTH,
        addr = ADDRESS_WIDTH,
    );
    for row in rows {
        let incident = row.incident;
        let _ = writeln!(
            out,
            "{:<10} {}{:<9} {:<12} {:<8} {:<title$} {:<addr$} {:<10} {}",
            incident.display_id(),
            priority_marker(incident.priority),
            incident.priority,
            incident.status,
            incident.incident_type,
            truncate(&incident.title, TITLE_WIDTH),
            truncate(&incident.location.address, ADDRESS_WIDTH),
            truncate(&assignee(incident, viewer), 10),
            format_relative(incident.created_at, now, offset),
            title = TITLE_WIDTH,
            addr = ADDRESS_WIDTH,
        );
    }
    out
}

fn menu_labels(actions: &[IncidentAction]) -> String {
    if actions.is_empty() {
        return "(none)".to_string();
    }
    actions
        .iter()
        .map(|a| format!("{} [{}]", a.label(), a))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn incident_detail(
    incident: &Incident,
    actions: &[IncidentAction],
    viewer: Option<&UserId>,
    offset: UtcOffset,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  {}", incident.display_id(), incident.title);
    let _ = writeln!(
        out,
        "  {} / {} / {}",
        incident.incident_type, incident.priority, incident.status
    );
    if !incident.description.is_empty() {
        let _ = writeln!(out, "  {}", incident.description);
    }
    let _ = writeln!(out, "  location:   {}", incident.location.address);
    if let (Some(lat), Some(lng)) = (incident.location.lat, incident.location.lng) {
        let _ = writeln!(out, "  coords:     {:.5}, {:.5}", lat, lng);
    }
    let _ = writeln!(out, "  assignee:   {}", assignee(incident, viewer));
    if let Some(station) = &incident.station_id {
        let _ = writeln!(out, "  station:    {}", station);
    }
    match (&incident.reporter_info, incident.is_anonymous()) {
        (Some(info), _) => {
            let name = info.name.as_deref().unwrap_or("anonymous");
            let _ = match &info.phone {
                Some(phone) => writeln!(out, "  reporter:   {} ({})", name, phone),
                None => writeln!(out, "  reporter:   {}", name),
            };
        }
        (None, true) => {
            let _ = writeln!(out, "  reporter:   anonymous");
        }
        (None, false) => {}
    }
    if let Some(notes) = &incident.notes {
        let _ = writeln!(out, "  notes:      {}", notes);
    }
    let _ = writeln!(
        out,
        "  created:    {}",
        format_date_time(incident.created_at, offset)
    );
    let _ = writeln!(
        out,
        "  updated:    {}",
        format_date_time(incident.updated_at, offset)
    );
    if let Some(at) = incident.resolved_at {
        let _ = writeln!(out, "  resolved:   {}", format_date_time(at, offset));
    }
    if let Some(at) = incident.escalated_at {
        let reason = incident.escalation_reason.as_deref().unwrap_or("");
        let _ = writeln!(
            out,
            "  escalated:  {} (level {}) {}",
            format_date_time(at, offset),
            incident.escalation_level,
            reason
        );
    }
    if incident.upvote_count > 0 {
        let _ = writeln!(out, "  upvotes:    {}", incident.upvote_count);
    }
    let _ = writeln!(out, "  actions:    {}", menu_labels(actions));
    out
}

pub(crate) fn action_list(incident: &Incident, actions: &[IncidentAction]) -> String {
    let mut out = String::new();
    if actions.is_empty() {
        let _ = writeln!(out, "No actions available on {}", incident.display_id());
        return out;
    }
    for action in actions {
        let _ = writeln!(out, "{:<20} {}", action.as_str(), action.label());
    }
    out
}

pub(crate) fn stats_text(stats: &IncidentStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "total       {}", stats.total);
    let _ = writeln!(out, "open        {}", stats.open());
    let _ = writeln!(out, "unassigned  {}", stats.unassigned);
    let _ = writeln!(out, "escalated   {}", stats.escalated);
    let _ = writeln!(out, "resolved today {}", stats.resolved_today);
    let _ = writeln!(out, "by status:");
    for status in Status::ALL {
        let count = stats.count_status(*status);
        if count > 0 {
            let _ = writeln!(out, "  {:<12} {}", status, count);
        }
    }
    if !stats.by_priority.is_empty() {
        let _ = writeln!(out, "by priority:");
        for priority in Priority::ALL.iter().rev() {
            if let Some(count) = stats.by_priority.get(priority.as_str()) {
                let _ = writeln!(out, "  {:<12} {}", priority, count);
            }
        }
    }
    if !stats.by_type.is_empty() {
        let _ = writeln!(out, "by type:");
        for (kind, count) in &stats.by_type {
            let _ = writeln!(out, "  {:<12} {}", kind, count);
        }
    }
    out
}

pub(crate) fn users_table(users: &[User]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<24} {:<28} {:<14} {:<8} {}",
        "ID", "NAME", "EMAIL", "ROLE", "STATION", "ORG"
    );
    for user in users {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:<28} {:<14} {:<8} {}",
            user.id,
            truncate(&user.name, 24),
            truncate(&user.email, 28),
            user.role,
            user.station_id.as_ref().map_or("-", |s| s.as_str()),
            user.organization_id.as_ref().map_or("-", |o| o.as_str()),
        );
    }
    out
}

pub(crate) fn stations_table(stations: &[Station]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<8} {:<28} {:<8} {}", "ID", "NAME", "ORG", "ADDRESS");
    for station in stations {
        let _ = writeln!(
            out,
            "{:<8} {:<28} {:<8} {}",
            station.id,
            truncate(&station.name, 28),
            station.organization_id.as_ref().map_or("-", |o| o.as_str()),
            station.address.as_deref().unwrap_or(""),
        );
    }
    out
}

pub(crate) fn organizations_table(organizations: &[Organization]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<8} {}", "ID", "NAME");
    for org in organizations {
        let _ = writeln!(out, "{:<8} {}", org.id, org.name);
    }
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
