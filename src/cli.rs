//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand};

/// Default first priority of the managed window.
pub const DEFAULT_BASE_PRIORITY: i64 = 8000;
/// Default last priority of the managed window.
pub const DEFAULT_MAX_PRIORITY: i64 = 8999;
/// Default description stamped on created rules.
pub const DEFAULT_COMMENT: &str = "by fw-updater";
/// Default domain the netblock walk starts from.
pub const DEFAULT_BASE_DOMAIN: &str = "_cloud-netblocks.googleusercontent.com";
/// Default nameserver answering the TXT queries.
pub const DEFAULT_DOMAIN_SERVER: &str = "8.8.8.8";

#[derive(Parser)]
#[command(name = "fw-updater")]
#[command(author, version, about = "Static-IP ingress firewall updater for App Engine apps")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only, for cron)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile allow rules against the ranges read from stdin
    #[command(visible_alias = "a")]
    Allow(RuleArgs),

    /// Reconcile deny rules against the ranges read from stdin
    #[command(visible_alias = "d")]
    Deny(RuleArgs),
}

/// Flags shared by the allow and deny subcommands.
#[derive(Args, Debug)]
pub struct RuleArgs {
    /// Apps ID (the GCP project) whose firewall is updated
    #[arg(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub apps_id: String,

    /// First priority of the managed window
    #[arg(long, default_value_t = DEFAULT_BASE_PRIORITY)]
    pub base_priority: i64,

    /// Last priority of the managed window
    #[arg(long, default_value_t = DEFAULT_MAX_PRIORITY)]
    pub max_priority: i64,

    /// Description set on each created rule
    #[arg(long, default_value = DEFAULT_COMMENT)]
    pub comment: String,

    /// Report the diff without touching the firewall
    #[arg(long)]
    pub dryrun: bool,
}

/// Companion binary that prints the provider netblocks, one per line, in a
/// form the reconciler accepts on stdin.
#[derive(Parser)]
#[command(name = "netblocks")]
#[command(author, version, about = "Resolve provider netblocks by walking SPF-style TXT records")]
pub struct ResolverCli {
    /// Domain whose TXT chain is walked
    #[arg(long, default_value = DEFAULT_BASE_DOMAIN)]
    pub base_domain: String,

    /// Nameserver queried over UDP port 53
    #[arg(long, default_value = DEFAULT_DOMAIN_SERVER)]
    pub domain_server: String,

    /// Accepted for pipeline compatibility; has no effect here
    #[arg(long, default_value_t = DEFAULT_BASE_PRIORITY)]
    pub base_priority: i64,

    /// Accepted for pipeline compatibility; has no effect here
    #[arg(long)]
    pub update: bool,

    /// Quiet mode (errors only, for cron)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long)]
    pub verbose: bool,
}
