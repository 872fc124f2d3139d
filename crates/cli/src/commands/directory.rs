use dispatch_core::{scope_incidents, IncidentStats};

use super::print_json;
use crate::context::Context;
use crate::error::CliError;
use crate::render;

pub(crate) async fn cmd_stats(ctx: &Context, local: bool) -> Result<(), CliError> {
    let stats = if local {
        let user = ctx.user().await?;
        let incidents = ctx.client.incidents().await?;
        let scoped = scope_incidents(&incidents, &user);
        IncidentStats::from_incidents(scoped, ctx.now(), ctx.offset)
    } else {
        IncidentStats::clone(&*ctx.client.stats().await?)
    };

    if ctx.is_json() {
        print_json(&stats);
    } else {
        print!("{}", render::stats_text(&stats));
    }
    Ok(())
}

pub(crate) async fn cmd_users(ctx: &Context) -> Result<(), CliError> {
    let users = ctx.client.users().await?;
    if ctx.is_json() {
        print_json(&*users);
    } else {
        print!("{}", render::users_table(&users));
    }
    Ok(())
}

pub(crate) async fn cmd_stations(ctx: &Context) -> Result<(), CliError> {
    let stations = ctx.client.stations().await?;
    if ctx.is_json() {
        print_json(&*stations);
    } else {
        print!("{}", render::stations_table(&stations));
    }
    Ok(())
}

pub(crate) async fn cmd_organizations(ctx: &Context) -> Result<(), CliError> {
    let organizations = ctx.client.organizations().await?;
    if ctx.is_json() {
        print_json(&*organizations);
    } else {
        print!("{}", render::organizations_table(&organizations));
    }
    Ok(())
}
