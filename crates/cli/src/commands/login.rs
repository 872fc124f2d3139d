use dispatch_client::ClientError;
use dispatch_core::LoginForm;

use super::print_json;
use crate::context::Context;
use crate::error::CliError;

/// The token is printed for the shell to export, never written to disk.
pub(crate) async fn cmd_login(ctx: &Context, email: String, password: String) -> Result<(), CliError> {
    let form = LoginForm { email, password };
    let session = ctx.client.login(&form).await.map_err(|e| match e {
        ClientError::Unauthorized { message } => CliError::Usage(format!("login failed: {}", message)),
        other => other.into(),
    })?;
    tracing::info!(user = %session.user.id, "logged in");

    if ctx.is_json() {
        print_json(&session);
        return Ok(());
    }
    if !ctx.quiet {
        println!(
            "Logged in as {} <{}> ({})",
            session.user.name, session.user.email, session.user.role
        );
    }
    println!("export DISPATCH_TOKEN={}", session.token);
    println!("export DISPATCH_USER_ID={}", session.user.id);
    Ok(())
}
