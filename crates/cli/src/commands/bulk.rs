//! Bulk operations and CSV export.
//!
//! Every id must be inside the caller's visibility scope. Status and
//! priority changes plus assignment are admin operations; export is open to
//! every role that sees incidents at all.

use std::path::Path;

use dispatch_client::BulkOutcome;
use dispatch_core::{
    scope_incidents, BulkAction, BulkRequest, IncidentId, Priority, Role, Status, User,
};

use super::print_json;
use crate::context::{normalize_id, Context};
use crate::error::CliError;

/// Resolve `ids` against the caller's scoped list. An empty `ids` selects
/// the whole scope.
async fn scoped_ids(ctx: &Context, user: &User, ids: &[String]) -> Result<Vec<IncidentId>, CliError> {
    let incidents = ctx.client.incidents().await?;
    let visible = scope_incidents(&incidents, user);

    if ids.is_empty() {
        return Ok(visible.iter().map(|i| i.id.clone()).collect());
    }
    ids.iter()
        .map(|raw| {
            let id = IncidentId::from(normalize_id(raw)?);
            if visible.iter().any(|i| i.id == id) {
                Ok(id)
            } else {
                Err(CliError::OutOfScope(raw.clone()))
            }
        })
        .collect()
}

pub(crate) async fn cmd_bulk(
    ctx: &Context,
    action: BulkAction,
    ids: &[String],
    to: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
) -> Result<(), CliError> {
    let user = ctx.user().await?;
    if action != BulkAction::Export && !user.role.is_admin() {
        return Err(CliError::Usage(format!(
            "bulk {} requires an admin role",
            action
        )));
    }
    if user.role == Role::Citizen {
        return Err(CliError::Usage("citizens cannot export incidents".to_string()));
    }

    let mut request = BulkRequest::new(action, scoped_ids(ctx, &user, ids).await?);
    if let Some(to) = to {
        request = request.with_data("assignedToId", normalize_id(&to)?);
    }
    if let Some(status) = status {
        request = request.with_data("status", status.as_str());
    }
    if let Some(priority) = priority {
        request = request.with_data("priority", priority.as_str());
    }

    let count = request.incident_ids.len();
    match ctx.client.bulk(&request).await? {
        BulkOutcome::Csv(bytes) => write_csv(&bytes, None),
        BulkOutcome::Summary(summary) => {
            if ctx.is_json() {
                print_json(&summary);
            } else if !ctx.quiet {
                println!("bulk {} applied to {} incident(s)", action, count);
            }
            Ok(())
        }
    }
}

pub(crate) async fn cmd_export(ctx: &Context, ids: &[String], out: Option<&Path>) -> Result<(), CliError> {
    let user = ctx.user().await?;
    if user.role == Role::Citizen {
        return Err(CliError::Usage("citizens cannot export incidents".to_string()));
    }
    let ids = scoped_ids(ctx, &user, ids).await?;
    if ids.is_empty() {
        return Err(CliError::Usage("no incidents to export".to_string()));
    }
    let count = ids.len();

    match ctx.client.bulk(&BulkRequest::new(BulkAction::Export, ids)).await? {
        BulkOutcome::Csv(bytes) => {
            write_csv(&bytes, out)?;
            if let Some(path) = out {
                if !ctx.quiet {
                    eprintln!("exported {} incident(s) to {}", count, path.display());
                }
            }
            Ok(())
        }
        BulkOutcome::Summary(_) => Err(CliError::Usage(
            "the backend did not return CSV for export".to_string(),
        )),
    }
}

fn write_csv(bytes: &[u8], out: Option<&Path>) -> Result<(), CliError> {
    match out {
        Some(path) => std::fs::write(path, bytes).map_err(|source| CliError::Write {
            path: path.display().to_string(),
            source,
        }),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(bytes)
                .map_err(|source| CliError::Write {
                    path: "stdout".to_string(),
                    source,
                })
        }
    }
}
