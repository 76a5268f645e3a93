// src/checker/pipeline.rs
// =============================================================================
// Drives DNS -> TCP -> HTTP for every target and collects the results.
//
// Per target:
//
//   Start --dns--> DnsDone --(failed)--------------------------> Terminal
//                     |
//                     +--tcp--> TcpDone --http--> HttpDone ----> Terminal
//
// - A DNS failure ends the pipeline: there is nothing to connect to
// - A TCP failure is recorded but HTTP still runs (some hosts drop bare
//   connects but serve HTTP fine through a proxy or CDN)
// - TCP and HTTP both use the hostname, not the IP from the DNS stage, so
//   either may land on a different address than DNS reported. TCP looks the
//   name up again through the batch's shared resolver; HTTP lets reqwest do
//   its own lookup
//
// For the batch:
// - Every pipeline is started at once; only HTTP is bounded (pool + pacing)
// - Results come back in completion order, fastest target first
// - The `shutdown` future stops the batch early; unfinished pipelines are
//   dropped and never show up as half-filled results
// =============================================================================

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::{Host, Url};

use super::dns::{probe_dns, DnsResolver};
use super::http::HttpProbe;
use super::pacing::PacingLimiter;
use super::result::{CheckResult, DnsOutcome};
use super::retry::Backoff;
use super::tcp::probe_tcp;
use crate::config::EngineConfig;
use crate::report::classify;
use crate::targets::{default_port, TargetEntry};

// Backoff base per stage (doubles on each retry)
const DNS_BACKOFF_BASE: Duration = Duration::from_millis(200);
const TCP_BACKOFF_BASE: Duration = Duration::from_millis(200);
const HTTP_BACKOFF_BASE: Duration = Duration::from_millis(300);

/// Results of one batch, in completion order.
#[derive(Debug)]
pub struct Batch {
    pub results: Vec<CheckResult>,
    /// True when the batch was stopped before every target finished
    pub interrupted: bool,
}

/// The probing engine for one batch run.
#[derive(Debug)]
pub struct Checker {
    config: EngineConfig,
    resolver: DnsResolver,
    dns_backoff: Backoff,
    tcp_backoff: Backoff,
    http: HttpProbe,
}

impl Checker {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let backoff = |base| Backoff::new(config.retries, base, config.backoff_jitter);

        let http = HttpProbe::new(
            config.concurrency,
            config.http_timeout,
            config.ssl_verify,
            PacingLimiter::new(config.rate_limit_delay, config.jitter_max),
            backoff(HTTP_BACKOFF_BASE),
        )?;

        Ok(Self {
            resolver: DnsResolver::new(config.dns_timeout),
            dns_backoff: backoff(DNS_BACKOFF_BASE),
            tcp_backoff: backoff(TCP_BACKOFF_BASE),
            http,
            config,
        })
    }

    // Checks every entry concurrently until all are done or `shutdown` fires
    pub async fn run<S>(&self, entries: Vec<TargetEntry>, shutdown: S) -> Batch
    where
        S: Future<Output = ()>,
    {
        let total = entries.len();
        info!(
            total,
            concurrency = self.config.concurrency,
            attempts_per_stage = self.dns_backoff.attempts(),
            "starting batch"
        );

        // No cap on pipelines in flight: DNS and TCP run fully in parallel,
        // HTTP is held back inside HttpProbe.
        let completed = stream::iter(entries)
            .map(|entry| self.check(entry))
            .buffer_unordered(total.max(1))
            .take_until(shutdown);
        tokio::pin!(completed);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = completed.next().await {
            info!(
                done = results.len() + 1,
                total,
                group = result.group(),
                url = result.url(),
                outcome = %classify(&result),
                "check finished"
            );
            results.push(result);
        }

        let interrupted = results.len() < total;
        if interrupted {
            info!(done = results.len(), total, "batch interrupted");
        }

        Batch {
            results,
            interrupted,
        }
    }

    // Runs the three stages for one entry
    #[instrument(skip(self, entry), fields(url = %entry.url))]
    pub async fn check(&self, entry: TargetEntry) -> CheckResult {
        let parsed = match Url::parse(&entry.url) {
            Ok(parsed) => parsed,
            Err(e) => return CheckResult::dns_failed(entry, format!("invalid URL: {}", e)),
        };

        // Bracket-free host text that the resolver and connect() accept
        let host = match parsed.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return CheckResult::dns_failed(entry, "URL has no host"),
        };
        let port = default_port(&parsed);

        let dns = probe_dns(
            &self.resolver,
            &host,
            self.config.dns_timeout,
            &self.dns_backoff,
        )
        .await;
        let (ip, dns_latency) = match dns {
            DnsOutcome::Resolved { ip, latency } => (ip, latency),
            DnsOutcome::Failed { error } => {
                debug!(%error, "dns failed, skipping tcp and http");
                return CheckResult::dns_failed(entry, error);
            }
        };

        let tcp = probe_tcp(
            &self.resolver,
            &host,
            port,
            self.config.tcp_timeout,
            &self.tcp_backoff,
        )
        .await;
        let http = self.http.probe(&entry.url).await;

        CheckResult::completed(entry, ip, dns_latency, tcp, http)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why buffer_unordered(total) instead of spawning tasks?
//    - Every pipeline is just a future borrowing `&self`
//    - buffer_unordered polls all of them on the current task and yields each
//      result the moment it finishes, no Arc or 'static needed
//
// 2. What does take_until do?
//    - It ends the stream as soon as the given future completes
//    - Futures still in the buffer are dropped, which cancels them at their
//      next .await point (a DNS lookup, a connect, a sleep...)
//
// 3. Why is the DNS resolver shared?
//    - hickory keeps a cache and its own sockets, so one resolver per batch
//      means the TCP stage's lookup is usually answered from memory
//
// 4. Why does check() take the entry by value?
//    - The entry ends up inside the CheckResult, so the pipeline owns it
//      from start to finish and nothing has to be cloned
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::result::{HttpOutcome, TcpOutcome};
    use crate::checker::test_support::{serve, Reply};

    fn quick_config() -> EngineConfig {
        EngineConfig {
            concurrency: 4,
            retries: 0,
            dns_timeout: Duration::from_secs(3),
            tcp_timeout: Duration::from_secs(2),
            http_timeout: Duration::from_secs(5),
            rate_limit_delay: Duration::ZERO,
            jitter_max: Duration::ZERO,
            backoff_jitter: Duration::ZERO,
            ssl_verify: true,
        }
    }

    fn assert_pipeline_rules(result: &CheckResult) {
        if result.dns_ip().is_none() {
            assert_eq!(result.tcp_ok(), None);
            assert_eq!(result.http_status(), None);
            assert_eq!(result.http_error(), None);
            assert!(!result.challenge_detected());
        } else {
            assert!(result.tcp_ok().is_some());
            assert!(result.http_status().is_some() || result.http_error().is_some());
        }
    }

    #[tokio::test]
    async fn test_healthy_target_runs_every_stage() {
        let addr = serve(Reply::ok("hello")).await;
        let checker = Checker::new(quick_config()).unwrap();

        let result = checker
            .check(TargetEntry::new("A", format!("http://{}/", addr)))
            .await;

        assert_pipeline_rules(&result);
        assert_eq!(result.dns_ip(), Some(std::net::Ipv4Addr::LOCALHOST));
        assert_eq!(result.tcp_ok(), Some(true));
        assert_eq!(result.http_status(), Some(200));
        assert!(!result.challenge_detected());
    }

    #[tokio::test]
    async fn test_dns_failure_short_circuits() {
        let checker = Checker::new(quick_config()).unwrap();

        let result = checker
            .check(TargetEntry::new("A", "https://nonexistent.invalid"))
            .await;

        assert_pipeline_rules(&result);
        assert!(result.dns_error().is_some());
        assert!(result.tcp().is_none());
        assert!(result.http().is_none());
    }

    #[tokio::test]
    async fn test_tcp_failure_still_runs_http() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let checker = Checker::new(quick_config()).unwrap();

        let result = checker
            .check(TargetEntry::new("A", format!("http://127.0.0.1:{}/", port)))
            .await;

        assert_pipeline_rules(&result);
        assert!(matches!(result.tcp(), Some(TcpOutcome::Failed { .. })));
        assert!(matches!(result.http(), Some(HttpOutcome::Failed { .. })));
    }

    #[tokio::test]
    async fn test_unparsable_entry_is_reported_not_dropped() {
        let checker = Checker::new(quick_config()).unwrap();

        // What the loader keeps for "Full URL: exa mple.com"
        let result = checker
            .check(TargetEntry::new("A", "https://exa mple.com"))
            .await;

        assert_pipeline_rules(&result);
        assert!(result.dns_error().unwrap().starts_with("invalid URL"));
        assert_eq!(crate::report::classify(&result), crate::report::Outcome::Failure);
    }

    #[tokio::test]
    async fn test_batch_returns_one_result_per_entry() {
        let ok = serve(Reply::ok("hello")).await;
        let challenged = serve(Reply::ok("please solve this captcha")).await;
        let checker = Checker::new(quick_config()).unwrap();

        let entries = vec![
            TargetEntry::new("A", format!("http://{}/", ok)),
            TargetEntry::new("A", format!("http://{}/", challenged)),
            TargetEntry::new("B", "https://nonexistent.invalid"),
        ];

        let batch = checker.run(entries, std::future::pending()).await;

        assert!(!batch.interrupted);
        assert_eq!(batch.results.len(), 3);
        for result in &batch.results {
            assert_pipeline_rules(result);
        }
        assert_eq!(
            batch.results.iter().filter(|r| r.challenge_detected()).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_good_and_unresolvable_in_one_group() {
        let good = serve(Reply::ok("<html>all good</html>")).await;
        let checker = Checker::new(quick_config()).unwrap();

        let entries = vec![
            TargetEntry::new("A", format!("http://{}/", good)),
            TargetEntry::new("A", "https://nonexistent.invalid"),
        ];
        let batch = checker.run(entries, std::future::pending()).await;

        let summary = crate::report::summarize(&batch.results);
        assert_eq!(summary.len(), 1);
        assert_eq!(
            summary["A"],
            crate::report::GroupSummary {
                ok: 1,
                warning: 0,
                failure: 1
            }
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_batch() {
        let checker = Checker::new(quick_config()).unwrap();
        let entries = vec![TargetEntry::new("A", "https://nonexistent.invalid")];

        // Shutdown is already signalled before anything can finish
        let batch = checker.run(entries, std::future::ready(())).await;

        assert!(batch.interrupted);
        assert!(batch.results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let checker = Checker::new(quick_config()).unwrap();
        let batch = checker.run(Vec::new(), std::future::pending()).await;

        assert!(!batch.interrupted);
        assert!(batch.results.is_empty());
    }
}
