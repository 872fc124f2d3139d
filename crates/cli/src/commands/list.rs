use time::OffsetDateTime;

use dispatch_core::{
    build_view, DashboardQuery, DashboardView, FilterCriteria, Incident, SortState, User,
};

use super::print_json;
use crate::context::Context;
use crate::error::CliError;
use crate::render;
use crate::ListArgs;

pub(crate) fn query_from(args: &ListArgs) -> DashboardQuery {
    let mut criteria = FilterCriteria::default()
        .with_status(args.status.iter().copied())
        .with_priority(args.priority.iter().copied())
        .with_type(args.incident_type.iter().copied());
    if let Some(search) = &args.search {
        criteria = criteria.with_search(search);
    }
    if let Some(assigned) = args.assigned {
        criteria = criteria.with_assignee(assigned);
    }
    if let Some(range) = args.date {
        criteria = criteria.with_date_range(range);
    }
    criteria.location = args.location.clone();
    criteria.incident_id = args.incident_id.clone();

    let direction = args
        .direction
        .unwrap_or_else(|| args.sort.default_direction());
    DashboardQuery {
        criteria,
        sort: SortState::new(args.sort, direction),
    }
}

pub(crate) async fn cmd_list(ctx: &Context, args: &ListArgs) -> Result<(), CliError> {
    let user = ctx.user().await?;
    let incidents = ctx.client.incidents().await?;
    print_view(ctx, &incidents, &user, &query_from(args), ctx.now());
    Ok(())
}

/// Shared by `list` and every `watch` refresh.
pub(crate) fn print_view(
    ctx: &Context,
    incidents: &[Incident],
    user: &User,
    query: &DashboardQuery,
    now: OffsetDateTime,
) {
    let view = build_view(incidents, Some(user), query, now, ctx.offset);

    if ctx.is_json() {
        print_json(&view);
        return;
    }

    match &view {
        DashboardView::LoginRequired => println!("{}", crate::error::LOGIN_HINT),
        DashboardView::Empty => {
            let active = query.criteria.active_count();
            if active > 0 {
                println!("No incidents match the {} active filter(s).", active);
            } else {
                println!("No incidents to show.");
            }
        }
        DashboardView::Rows(rows) => {
            print!("{}", render::incident_table(rows, Some(&user.id), now, ctx.offset));
            if !ctx.quiet {
                let active = query.criteria.active_count();
                if active > 0 {
                    println!("{} incident(s), {} filter(s) active", rows.len(), active);
                } else {
                    println!("{} incident(s)", rows.len());
                }
            }
        }
    }
}
