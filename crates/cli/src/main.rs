//! epgedit CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway
//! - `validate`: Check an edited schedule against the rule set
//! - `rebuild`: Apply an edit submission to a schedule document
//! - `rules`: List or check the configured rule files
//! - `init`: Write a default config and data directory
//! - `doctor`: Diagnose config and data paths

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "epgedit",
    about = "epgedit: broadcast schedule rule validation and rebuild",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate an edited schedule (JSON) against the rule set
    Validate {
        /// `{"schedule": [...]}` payload or a bare array of entries
        schedule: PathBuf,

        /// Placement rules file (defaults to the configured one)
        #[arg(long)]
        placement: Option<PathBuf>,

        /// Neighbour rules file (defaults to the configured one)
        #[arg(long)]
        neighbour: Option<PathBuf>,
    },

    /// Rebuild one channel of a schedule from an edit submission
    Rebuild {
        /// XMLTV schedule document
        #[arg(long)]
        document: PathBuf,

        /// ScheduleRequest XML
        #[arg(long)]
        request: PathBuf,

        /// Day the rebuilt channel starts on (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect the configured rule set
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Write a default config file and data directory
    Init,

    /// Diagnose config and data paths
    Doctor,
}

#[derive(Subcommand)]
enum RulesAction {
    /// Print the rules in evaluation order
    List,
    /// Compile the rule files and report problems
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Validate {
            schedule,
            placement,
            neighbour,
        } => {
            let valid = commands::validate::run(&schedule, placement, neighbour).await?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Rebuild {
            document,
            request,
            date,
            output,
        } => commands::rebuild::run(&document, &request, date, output.as_deref()).await?,
        Commands::Rules { action } => match action {
            RulesAction::List => commands::rules::list().await?,
            RulesAction::Check => commands::rules::check().await?,
        },
        Commands::Init => commands::init::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
