//! Netblock resolution command.

use anyhow::{Context, Result};
use ipnet::IpNet;
use tracing::{debug, info, warn};

use crate::cli::ResolverCli;
use crate::resolver::{self, UdpTxtLookup};

/// Run the netblocks resolver and print one range per line.
pub async fn run(cli: ResolverCli) -> Result<()> {
    debug!(
        "compatibility flags: base_priority={} update={}",
        cli.base_priority, cli.update
    );

    let lookup = UdpTxtLookup::new(&cli.domain_server)
        .with_context(|| format!("cannot use {} as the nameserver", cli.domain_server))?;
    let ranges = resolver::resolve_ranges(&lookup, &cli.base_domain)
        .await
        .with_context(|| format!("failed to resolve netblocks below {}", cli.base_domain))?;
    info!("{} ranges below {}", ranges.len(), cli.base_domain);

    for range in &ranges {
        if range.parse::<IpNet>().is_err() {
            warn!("resolved range {:?} is not a CIDR, printing it verbatim", range);
        }
        println!("{}", range);
    }

    Ok(())
}
