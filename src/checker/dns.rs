// src/checker/dns.rs
// =============================================================================
// Stage 1: resolve the hostname to an IPv4 address.
//
// One async resolver (hickory) is built per batch and shared by every
// pipeline. It reads the system resolver config and /etc/hosts, so the check
// sees the same answers as other programs on this machine, but queries run
// on the tokio runtime itself: a slow domain never ties up a blocking thread
// that a healthy one is waiting for.
//
// Each attempt has its own timeout and the whole thing runs under the
// stage's backoff policy.
// =============================================================================

use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::warn;

use super::error::ProbeError;
use super::result::DnsOutcome;
use super::retry::Backoff;

/// Shared IPv4 resolver for one batch.
#[derive(Clone)]
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolver").finish_non_exhaustive()
    }
}

impl DnsResolver {
    /// Builds a resolver from the system config, with `query_timeout` per query.
    ///
    /// Retries are left to the stage's backoff, so hickory makes one attempt.
    pub fn new(query_timeout: Duration) -> Self {
        let (config, mut opts) = match read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                warn!(error = %e, "could not read system resolver config, using Google DNS");
                (ResolverConfig::google(), ResolverOpts::default())
            }
        };
        opts.timeout = query_timeout;
        opts.attempts = 1;
        opts.ip_strategy = LookupIpStrategy::Ipv4Only;

        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// First IPv4 address for `host`. IP literals are answered without a query.
    pub async fn first_ipv4(&self, host: &str) -> Result<Ipv4Addr, ProbeError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return match ip {
                IpAddr::V4(v4) => Ok(v4),
                IpAddr::V6(_) => Err(ProbeError::NoIpv4Address(host.to_string())),
            };
        }

        let lookup = self.inner.lookup_ip(host).await?;
        lookup
            .iter()
            .find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| ProbeError::NoIpv4Address(host.to_string()))
    }
}

// Resolves `host` and reports the first IPv4 address found
pub async fn probe_dns(
    resolver: &DnsResolver,
    host: &str,
    limit: Duration,
    backoff: &Backoff,
) -> DnsOutcome {
    match backoff.run("dns", || resolve_once(resolver, host, limit)).await {
        Ok((ip, latency)) => DnsOutcome::Resolved { ip, latency },
        Err(e) => DnsOutcome::Failed {
            error: e.to_string(),
        },
    }
}

async fn resolve_once(
    resolver: &DnsResolver,
    host: &str,
    limit: Duration,
) -> Result<(Ipv4Addr, Duration), ProbeError> {
    let start = Instant::now();

    let ip = timeout(limit, resolver.first_ipv4(host))
        .await
        .map_err(|_| ProbeError::Timeout(limit))??;

    Ok((ip, start.elapsed()))
}
