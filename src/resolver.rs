//! Recursive netblock discovery over DNS TXT records.
//!
//! Walks SPF-style TXT chains starting from a base domain: `include:` tokens
//! recurse into another domain, `ip4:` tokens contribute one range, every
//! other token is ignored. The walk is depth-first and order-preserving, so
//! an include's ranges land exactly where the token sat.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

use crate::error::{Error, Result};

const INCLUDE_PREFIX: &str = "include:";
const IP4_PREFIX: &str = "ip4:";
const DNS_PORT: u16 = 53;

/// Hard cap on include nesting. Real chains are two or three levels deep;
/// anything past this is a broken or hostile zone.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// TXT record lookup against a fixed nameserver.
#[async_trait]
pub trait TxtLookup: Send + Sync {
    /// All TXT records of `domain`, one string per record with its
    /// character-string chunks concatenated.
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>>;
}

/// TXT lookup over UDP through hickory-resolver.
#[derive(Debug)]
pub struct UdpTxtLookup {
    resolver: TokioAsyncResolver,
}

impl UdpTxtLookup {
    /// Build a lookup that queries `nameserver` (a bare IP) on port 53.
    pub fn new(nameserver: &str) -> Result<Self> {
        let ip: IpAddr = nameserver
            .parse()
            .map_err(|_| Error::InvalidNameserver(nameserver.to_string()))?;

        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(
            SocketAddr::new(ip, DNS_PORT),
            Protocol::Udp,
        ));
        let resolver = TokioAsyncResolver::tokio(config, ResolverOpts::default());
        Ok(Self { resolver })
    }
}

#[async_trait]
impl TxtLookup for UdpTxtLookup {
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>> {
        let lookup = self
            .resolver
            .txt_lookup(domain)
            .await
            .map_err(|e| Error::TxtLookup {
                domain: domain.to_string(),
                source: Box::new(e),
            })?;

        let records = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect();
        Ok(records)
    }
}

/// Resolve the flat list of ranges reachable from `base_domain`.
///
/// Tokens contribute in record order; includes splice their results in
/// place. The first failing lookup aborts the whole resolution. A domain
/// that recurses into itself is rejected, as is nesting deeper than
/// [`MAX_INCLUDE_DEPTH`].
pub async fn resolve_ranges(lookup: &dyn TxtLookup, base_domain: &str) -> Result<Vec<String>> {
    let mut ranges = Vec::new();
    let mut chain = Vec::new();
    walk(lookup, base_domain.to_string(), &mut chain, &mut ranges).await?;
    debug!("{} ranges below {}", ranges.len(), base_domain);
    Ok(ranges)
}

fn walk<'a>(
    lookup: &'a dyn TxtLookup,
    domain: String,
    chain: &'a mut Vec<String>,
    out: &'a mut Vec<String>,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if chain.iter().any(|seen| *seen == domain) {
            return Err(Error::IncludeCycle(domain));
        }
        if chain.len() >= MAX_INCLUDE_DEPTH {
            return Err(Error::IncludeDepth {
                domain,
                max: MAX_INCLUDE_DEPTH,
            });
        }

        let records = lookup.lookup_txt(&domain).await?;
        debug!("{}: {} TXT records", domain, records.len());
        chain.push(domain);

        for record in &records {
            for token in record.split(' ') {
                if let Some(target) = token.strip_prefix(INCLUDE_PREFIX) {
                    walk(lookup, target.to_string(), chain, out).await?;
                } else if let Some(range) = token.strip_prefix(IP4_PREFIX) {
                    out.push(range.to_string());
                }
            }
        }

        chain.pop();
        Ok(())
    }
    .boxed()
}
