//! Allow/deny reconciliation command.
//!
//! Pipeline: acquire a token, list the app's current rules, read the desired
//! ranges from stdin, then plan and apply the diff.

use anyhow::{Context, Result};
use ipnet::IpNet;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::auth::{DefaultTokenProvider, TokenProvider};
use crate::cli::RuleArgs;
use crate::provider::{AppEngineClient, FirewallApi, RuleAction};
use crate::reconciler::{self, PriorityWindow};

/// Run the allow or deny subcommand.
pub async fn run(action: RuleAction, args: RuleArgs) -> Result<()> {
    let token = DefaultTokenProvider::new()?
        .access_token()
        .await
        .context("failed to acquire credentials for the firewall API")?;
    let client = AppEngineClient::new(token).context("failed to build the firewall API client")?;

    let existing = client
        .list_ingress_rules(&args.apps_id)
        .await
        .with_context(|| format!("failed to list ingress rules of {}", args.apps_id))?;
    info!("{} existing rules in {}", existing.len(), args.apps_id);

    let desired = read_ranges_from_stdin()
        .await
        .context("failed to read source ranges from stdin")?;
    for range in &desired {
        if !range.is_empty() && range.parse::<IpNet>().is_err() {
            warn!("desired range {:?} is not a CIDR, matching it verbatim", range);
        }
    }

    let window = PriorityWindow::new(args.base_priority, args.max_priority);
    let plan = reconciler::plan(&existing, &desired, window);
    if plan.is_empty() {
        info!("{} already matches the desired ranges", args.apps_id);
        return Ok(());
    }

    let outcome = reconciler::apply(
        &client,
        &args.apps_id,
        action,
        &args.comment,
        args.dryrun,
        &plan,
    )
    .await?;
    info!(
        "{} rules created, {} deleted",
        outcome.created.len(),
        outcome.deleted.len()
    );

    Ok(())
}

/// One desired range per stdin line. Lines are kept verbatim, including
/// empty ones; the planner decides what to skip.
async fn read_ranges_from_stdin() -> std::io::Result<Vec<String>> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut ranges = Vec::new();
    while let Some(line) = lines.next_line().await? {
        ranges.push(line);
    }
    Ok(ranges)
}
