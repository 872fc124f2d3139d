//! Subcommand implementations. Each `cmd_*` resolves what it needs from the
//! [`Context`], talks to the backend through the cached client, and prints
//! either text or JSON.

mod bulk;
mod directory;
mod incident;
mod list;
mod login;
mod watch;

use serde::Serialize;

use dispatch_core::IncidentAction;

use crate::context::Context;
use crate::error::CliError;
use crate::{Commands, GlobalArgs};

pub(crate) async fn run(command: Commands, global: &GlobalArgs) -> Result<(), CliError> {
    let ctx = Context::new(global)?;

    match command {
        Commands::Login { email, password } => login::cmd_login(&ctx, email, password).await,
        Commands::List { args } => list::cmd_list(&ctx, &args).await,
        Commands::Show { id } => incident::cmd_show(&ctx, &id).await,
        Commands::Actions { id } => incident::cmd_actions(&ctx, &id).await,
        Commands::Take { id } => {
            incident::cmd_perform(&ctx, &id, &[IncidentAction::TakeCase], Default::default())
                .await
        }
        Commands::Start { id } => {
            incident::cmd_perform(&ctx, &id, &[IncidentAction::StartWorking], Default::default())
                .await
        }
        Commands::Resolve { id } => {
            incident::cmd_perform(
                &ctx,
                &id,
                &[IncidentAction::MarkResolved, IncidentAction::Resolve],
                Default::default(),
            )
            .await
        }
        Commands::Escalate { id, reason } => {
            incident::cmd_escalate(&ctx, &id, reason).await
        }
        Commands::Assign { id, to } => incident::cmd_assign(&ctx, &id, to).await,
        Commands::Update {
            id,
            status,
            priority,
            title,
            description,
            notes,
        } => {
            let update = dispatch_core::IncidentUpdate {
                status,
                priority,
                title,
                description,
                notes,
            };
            incident::cmd_update(&ctx, &id, update).await
        }
        Commands::Bulk {
            action,
            ids,
            to,
            status,
            priority,
        } => bulk::cmd_bulk(&ctx, action, &ids, to, status, priority).await,
        Commands::Export { ids, out } => bulk::cmd_export(&ctx, &ids, out.as_deref()).await,
        Commands::Stats { local } => directory::cmd_stats(&ctx, local).await,
        Commands::Watch { args, interval } => watch::cmd_watch(&ctx, &args, interval).await,
        Commands::Users => directory::cmd_users(&ctx).await,
        Commands::Stations => directory::cmd_stations(&ctx).await,
        Commands::Organizations => directory::cmd_organizations(&ctx).await,
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
    println!("{}", pretty);
}
