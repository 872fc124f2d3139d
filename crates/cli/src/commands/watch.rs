//! `dispatch watch`: the list view redrawn on every background refresh.

use crate::commands::list::{print_view, query_from};
use crate::context::Context;
use crate::error::CliError;
use crate::ListArgs;

pub(crate) async fn cmd_watch(
    ctx: &Context,
    args: &ListArgs,
    interval: Option<u64>,
) -> Result<(), CliError> {
    let user = ctx.user().await?;
    let query = query_from(args);

    let mut config = ctx.config.clone();
    if let Some(secs) = interval {
        config.refresh.incidents_secs = secs;
    }
    let every = config.incidents_interval();
    tracing::info!(every_secs = every.as_secs(), "watching incidents");

    let mut handle = ctx.client.poll_incidents(every);
    loop {
        let polled = tokio::select! {
            polled = handle.next() => polled,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(polled) = polled else { break };

        match polled.result {
            Ok(incidents) => {
                let now = ctx.now();
                if !ctx.is_json() && !ctx.quiet {
                    println!(
                        "── refresh {} at {} ──",
                        polled.sequence,
                        dispatch_core::dates::format_date_time(now, ctx.offset)
                    );
                }
                print_view(ctx, &incidents, &user, &query, now);
            }
            Err(e) if e.is_auth() => {
                return Err(CliError::LoginRequired(Some(e.to_string())));
            }
            Err(e) => eprintln!("refresh {} failed: {}", polled.sequence, e),
        }
    }
    Ok(())
}
