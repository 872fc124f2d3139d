mod commands;
mod context;
mod error;
mod render;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch_core::{
    AssigneeFilter, BulkAction, DateRange, IncidentType, Priority, SortDirection, SortField,
    Status,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Role-scoped incident dashboard for the terminal.
#[derive(Parser)]
#[command(
    name = "dispatch",
    version,
    about = "Role-scoped incident dashboard for the terminal"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GlobalArgs {
    /// Path to a dispatch.toml config file (default: ./dispatch.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log requests and refreshes to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "DISPATCH_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token from `dispatch login`
    #[arg(long, global = true, env = "DISPATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Id of the signed-in user
    #[arg(long, global = true, env = "DISPATCH_USER_ID")]
    pub user: Option<String>,
}

/// Search and sort options shared by `list` and `watch`.
#[derive(Args, Debug, Clone)]
pub(crate) struct ListArgs {
    /// Free-text search over title, description, address and notes
    #[arg(long, short)]
    pub search: Option<String>,

    /// Status filter (repeat or comma-separate)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<Status>,

    /// Priority filter (repeat or comma-separate)
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<Priority>,

    /// Incident type filter (repeat or comma-separate)
    #[arg(long = "type", value_delimiter = ',')]
    pub incident_type: Vec<IncidentType>,

    /// Ownership filter: me, unassigned or anyone
    #[arg(long)]
    pub assigned: Option<AssigneeFilter>,

    /// Address substring
    #[arg(long)]
    pub location: Option<String>,

    /// Incident id or INC- reference substring
    #[arg(long = "id")]
    pub incident_id: Option<String>,

    /// Created within: today, yesterday, week or month
    #[arg(long)]
    pub date: Option<DateRange>,

    /// Sort column
    #[arg(long, default_value = "created_at")]
    pub sort: SortField,

    /// Sort direction (asc or desc); defaults to the column's natural order
    #[arg(long)]
    pub direction: Option<SortDirection>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Sign in and print the token to export
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DISPATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List incidents visible to you
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Show one incident with its action menu
    Show { id: String },

    /// List the actions you can take on an incident
    Actions { id: String },

    /// Take an unassigned case
    Take { id: String },

    /// Start working on a case assigned to you
    Start { id: String },

    /// Resolve an incident
    Resolve { id: String },

    /// Escalate an incident
    Escalate {
        id: String,
        /// Why the incident needs escalation
        #[arg(long)]
        reason: String,
    },

    /// Assign an incident to a staff member
    Assign {
        id: String,
        /// User id of the assignee
        #[arg(long)]
        to: String,
    },

    /// Edit incident fields (admins)
    Update {
        id: String,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Apply one action to several incidents
    Bulk {
        /// assign, update_status, update_priority or export
        action: BulkAction,
        /// Incident ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// Assignee for `assign`
        #[arg(long)]
        to: Option<String>,
        /// New status for `update_status`
        #[arg(long)]
        status: Option<Status>,
        /// New priority for `update_priority`
        #[arg(long)]
        priority: Option<Priority>,
    },

    /// Export incidents as CSV (default: everything visible to you)
    Export {
        ids: Vec<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Dashboard counters
    Stats {
        /// Count the visible list locally instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// Keep the incident list on screen, refreshing on an interval
    Watch {
        #[command(flatten)]
        args: ListArgs,
        /// Seconds between refreshes (clamped to 12-30)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// List users
    Users,

    /// List stations
    Stations,

    /// List organizations
    Organizations,
}

fn main() {
    let cli = Cli::parse();

    if cli.global.verbose {
        init_logging();
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                cli.global.output,
                cli.global.quiet,
            );
            process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(commands::run(cli.command, &cli.global)) {
        report_error(&e.to_string(), cli.global.output, cli.global.quiet);
        process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatch_cli=debug,dispatch_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
