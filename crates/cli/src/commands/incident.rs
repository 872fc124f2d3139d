//! Single-incident commands: detail, menu, and the menu actions.

use serde_json::json;

use dispatch_client::{ActionInput, ClientError};
use dispatch_core::{
    available_actions, is_permitted, menu_entries, Incident, IncidentAction, IncidentUpdate,
    Role, User, UserId,
};

use super::print_json;
use crate::context::{normalize_id, Context};
use crate::error::CliError;
use crate::render;

pub(crate) async fn cmd_show(ctx: &Context, id: &str) -> Result<(), CliError> {
    let user = ctx.user().await?;
    let incident = ctx.scoped_incident(&user, id).await?;
    let actions = available_actions(&incident, &user);

    if ctx.is_json() {
        print_json(&json!({
            "incident": incident,
            "displayId": incident.display_id(),
            "actions": menu_entries(&incident, &user),
        }));
    } else {
        print!(
            "{}",
            render::incident_detail(&incident, &actions, Some(&user.id), ctx.offset)
        );
    }
    Ok(())
}

pub(crate) async fn cmd_actions(ctx: &Context, id: &str) -> Result<(), CliError> {
    let user = ctx.user().await?;
    let incident = ctx.scoped_incident(&user, id).await?;

    if ctx.is_json() {
        print_json(&menu_entries(&incident, &user));
    } else {
        print!(
            "{}",
            render::action_list(&incident, &available_actions(&incident, &user))
        );
    }
    Ok(())
}

/// The first of `candidates` on the user's menu; the first candidate when
/// none is, so the refusal names the action the user asked for.
fn choose(incident: &Incident, user: &User, candidates: &[IncidentAction]) -> IncidentAction {
    candidates
        .iter()
        .copied()
        .find(|action| is_permitted(incident, user, *action))
        .or_else(|| candidates.first().copied())
        .unwrap_or(IncidentAction::ViewDetails)
}

pub(crate) async fn cmd_perform(
    ctx: &Context,
    id: &str,
    candidates: &[IncidentAction],
    input: ActionInput,
) -> Result<(), CliError> {
    let user = ctx.user().await?;
    let incident = ctx.scoped_incident(&user, id).await?;
    let action = choose(&incident, &user, candidates);

    let updated = ctx.client.perform(&incident, &user, action, input).await?;
    report_updated(ctx, action.label(), &updated);
    Ok(())
}

pub(crate) async fn cmd_escalate(ctx: &Context, id: &str, reason: String) -> Result<(), CliError> {
    let input = ActionInput {
        reason: Some(reason),
        ..ActionInput::default()
    };
    cmd_perform(ctx, id, &[IncidentAction::Escalate], input).await
}

pub(crate) async fn cmd_assign(ctx: &Context, id: &str, to: String) -> Result<(), CliError> {
    let input = ActionInput {
        assignee: Some(UserId::from(normalize_id(&to)?)),
        ..ActionInput::default()
    };
    cmd_perform(
        ctx,
        id,
        &[
            IncidentAction::AssignStaff,
            IncidentAction::AssignOrganization,
            IncidentAction::Reassign,
        ],
        input,
    )
    .await
}

/// Free-form edit. Station admins need Edit Incident on their menu; super
/// and main admins may edit anything in scope.
pub(crate) async fn cmd_update(
    ctx: &Context,
    id: &str,
    update: IncidentUpdate,
) -> Result<(), CliError> {
    let user = ctx.user().await?;
    let incident = ctx.scoped_incident(&user, id).await?;

    let allowed = is_permitted(&incident, &user, IncidentAction::EditIncident)
        || matches!(user.role, Role::SuperAdmin | Role::MainAdmin);
    if !allowed {
        return Err(ClientError::NotPermitted {
            action: IncidentAction::EditIncident.label().to_string(),
            incident: incident.display_id(),
        }
        .into());
    }

    let updated = ctx.client.update_incident(&incident, &update).await?;
    report_updated(ctx, "Update", &updated);
    Ok(())
}

fn report_updated(ctx: &Context, what: &str, updated: &Incident) {
    if ctx.is_json() {
        print_json(updated);
    } else if !ctx.quiet {
        println!(
            "{}: {} is now {}{}",
            what,
            updated.display_id(),
            updated.status,
            updated
                .assigned_to_id
                .as_ref()
                .map(|a| format!(" (assigned to {})", a))
                .unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(status: &str, assigned: Option<&str>) -> Incident {
        serde_json::from_value(json!({
            "id": 1, "type": "police", "priority": "low", "status": status,
            "title": "Break-in", "assignedToId": assigned,
            "createdAt": "2025-03-01T08:00:00Z", "updatedAt": "2025-03-01T08:00:00Z"
        }))
        .unwrap()
    }

    fn user(role: &str) -> User {
        serde_json::from_value(json!({"id": "u1", "role": role, "stationId": 1})).unwrap()
    }

    #[test]
    fn resolve_prefers_the_entry_on_the_menu() {
        let mine = incident("in_progress", Some("u1"));
        let candidates = [IncidentAction::MarkResolved, IncidentAction::Resolve];
        assert_eq!(
            choose(&mine, &user("station_staff"), &candidates),
            IncidentAction::MarkResolved
        );
        assert_eq!(
            choose(&mine, &user("super_admin"), &candidates),
            IncidentAction::Resolve
        );
    }

    #[test]
    fn assign_picks_station_or_org_scope() {
        let open = incident("reported", None);
        let candidates = [
            IncidentAction::AssignStaff,
            IncidentAction::AssignOrganization,
            IncidentAction::Reassign,
        ];
        assert_eq!(
            choose(&open, &user("station_admin"), &candidates),
            IncidentAction::AssignStaff
        );
        assert_eq!(
            choose(&open, &user("main_admin"), &candidates),
            IncidentAction::AssignOrganization
        );
    }

    #[test]
    fn refusal_names_requested_action() {
        let open = incident("reported", None);
        assert_eq!(
            choose(&open, &user("citizen"), &[IncidentAction::Escalate]),
            IncidentAction::Escalate
        );
    }
}
