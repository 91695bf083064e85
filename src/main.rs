mod commands;
mod config;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::ConnectionArgs;

#[derive(Parser)]
#[command(name = "prosweet")]
#[command(about = "Manage the events of a CalDAV calendar from the command line")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the events in the calendar
    List {
        /// Only events ending after this date/time
        #[arg(long)]
        from: Option<String>,

        /// Only events starting before this date/time
        #[arg(long)]
        to: Option<String>,
    },
    /// Show a single event, with its ETag
    Show { uid: String },
    /// Create a new event
    Create {
        title: String,

        /// Start date/time (e.g. "2025-10-26T07:00" or RFC 3339)
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long)]
        end: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Use this UID instead of generating one
        #[arg(long)]
        uid: Option<String>,

        /// Alarm trigger, e.g. "-PT10M" or "20251026T065000Z" (repeatable)
        #[arg(short, long = "alarm")]
        alarms: Vec<String>,
    },
    /// Change fields of an existing event
    Update {
        uid: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,
    },
    /// Delete an event (succeeds if it is already gone)
    Delete { uid: String },
    /// Show when alarms fire
    Alarms {
        /// Window start (defaults to now)
        #[arg(long)]
        from: Option<String>,

        /// Window end (defaults to 30 days from now)
        #[arg(long)]
        to: Option<String>,
    },
    /// Execute a resolver function call given as JSON ("-" reads stdin)
    Apply { call: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init()?;

    let cli = Cli::parse();
    let session = commands::Session::open(&cli.connection)?;

    match cli.command {
        Commands::List { from, to } => {
            commands::list::run(&session, from.as_deref(), to.as_deref()).await
        }
        Commands::Show { uid } => commands::show::run(&session, &uid).await,
        Commands::Create {
            title,
            start,
            end,
            description,
            uid,
            alarms,
        } => commands::create::run(&session, title, start, end, description, uid, alarms).await,
        Commands::Update {
            uid,
            title,
            description,
            start,
            end,
        } => commands::update::run(&session, uid, title, description, start, end).await,
        Commands::Delete { uid } => commands::delete::run(&session, &uid).await,
        Commands::Alarms { from, to } => {
            commands::alarms::run(&session, from.as_deref(), to.as_deref()).await
        }
        Commands::Apply { call } => commands::apply::run(&session, &call).await,
    }
}
