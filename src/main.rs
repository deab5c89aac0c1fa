//! fw-updater - Static-IP Firewall Updater for App Engine
//!
//! Reconciles an app's ingress firewall rules against source ranges read
//! from stdin.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use fw_updater::cli::{Cli, Commands};
use fw_updater::provider::RuleAction;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity. Diagnostics go to stderr; stdout
    // carries only the action report lines.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Allow(args) => {
            fw_updater::commands::reconcile::run(RuleAction::Allow, args).await
        }
        Commands::Deny(args) => fw_updater::commands::reconcile::run(RuleAction::Deny, args).await,
    }
}
