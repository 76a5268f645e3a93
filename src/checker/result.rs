// src/checker/result.rs
// =============================================================================
// What one pipeline run produces.
//
// Each stage reports a small enum (DnsOutcome, TcpOutcome, HttpOutcome), and
// a CheckResult is assembled from them exactly once, at the end. The two
// constructors are the only ways to build one, which keeps the pipeline rule
// in the type:
// - DNS failed    -> no TCP or HTTP outcome exists at all
// - DNS succeeded -> both TCP and HTTP outcomes exist
//
// Reports want flat "optional field" views (dns_ip, tcp_ok, http_status ...),
// so those are provided as accessors and as a serializable record.
// =============================================================================

use serde::Serialize;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::targets::TargetEntry;

#[derive(Debug, Clone, PartialEq)]
pub enum DnsOutcome {
    Resolved { ip: Ipv4Addr, latency: Duration },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TcpOutcome {
    Connected { latency: Duration },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HttpOutcome {
    Responded {
        status: u16,
        challenge: bool,
        latency: Duration,
    },
    Failed { error: String },
}

// Which stages ran and how they ended
#[derive(Debug, Clone, PartialEq)]
enum Stages {
    DnsFailed {
        error: String,
    },
    Completed {
        ip: Ipv4Addr,
        dns_latency: Duration,
        tcp: TcpOutcome,
        http: HttpOutcome,
    },
}

/// Final, immutable record of checking one target.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    entry: TargetEntry,
    stages: Stages,
}

impl CheckResult {
    /// DNS never resolved; TCP and HTTP were not attempted.
    pub fn dns_failed(entry: TargetEntry, error: impl Into<String>) -> Self {
        Self {
            entry,
            stages: Stages::DnsFailed {
                error: error.into(),
            },
        }
    }

    /// DNS resolved, then TCP and HTTP both ran.
    pub fn completed(
        entry: TargetEntry,
        ip: Ipv4Addr,
        dns_latency: Duration,
        tcp: TcpOutcome,
        http: HttpOutcome,
    ) -> Self {
        Self {
            entry,
            stages: Stages::Completed {
                ip,
                dns_latency,
                tcp,
                http,
            },
        }
    }

    pub fn group(&self) -> &str {
        &self.entry.group
    }

    pub fn url(&self) -> &str {
        &self.entry.url
    }

    pub fn original_text(&self) -> &str {
        &self.entry.original_text
    }

    pub fn dns(&self) -> DnsOutcome {
        match &self.stages {
            Stages::DnsFailed { error } => DnsOutcome::Failed {
                error: error.clone(),
            },
            Stages::Completed {
                ip, dns_latency, ..
            } => DnsOutcome::Resolved {
                ip: *ip,
                latency: *dns_latency,
            },
        }
    }

    /// None when DNS failed and TCP never ran.
    pub fn tcp(&self) -> Option<&TcpOutcome> {
        match &self.stages {
            Stages::DnsFailed { .. } => None,
            Stages::Completed { tcp, .. } => Some(tcp),
        }
    }

    /// None when DNS failed and HTTP never ran.
    pub fn http(&self) -> Option<&HttpOutcome> {
        match &self.stages {
            Stages::DnsFailed { .. } => None,
            Stages::Completed { http, .. } => Some(http),
        }
    }

    // ---- flat views ---------------------------------------------------------

    pub fn dns_ip(&self) -> Option<Ipv4Addr> {
        match &self.stages {
            Stages::Completed { ip, .. } => Some(*ip),
            Stages::DnsFailed { .. } => None,
        }
    }

    pub fn dns_error(&self) -> Option<&str> {
        match &self.stages {
            Stages::DnsFailed { error } => Some(error),
            Stages::Completed { .. } => None,
        }
    }

    pub fn dns_latency(&self) -> Option<Duration> {
        match &self.stages {
            Stages::Completed { dns_latency, .. } => Some(*dns_latency),
            Stages::DnsFailed { .. } => None,
        }
    }

    pub fn tcp_ok(&self) -> Option<bool> {
        self.tcp()
            .map(|tcp| matches!(tcp, TcpOutcome::Connected { .. }))
    }

    pub fn tcp_error(&self) -> Option<&str> {
        match self.tcp()? {
            TcpOutcome::Failed { error } => Some(error),
            TcpOutcome::Connected { .. } => None,
        }
    }

    pub fn tcp_latency(&self) -> Option<Duration> {
        match self.tcp()? {
            TcpOutcome::Connected { latency } => Some(*latency),
            TcpOutcome::Failed { .. } => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self.http()? {
            HttpOutcome::Responded { status, .. } => Some(*status),
            HttpOutcome::Failed { .. } => None,
        }
    }

    pub fn http_error(&self) -> Option<&str> {
        match self.http()? {
            HttpOutcome::Failed { error } => Some(error),
            HttpOutcome::Responded { .. } => None,
        }
    }

    pub fn http_latency(&self) -> Option<Duration> {
        match self.http()? {
            HttpOutcome::Responded { latency, .. } => Some(*latency),
            HttpOutcome::Failed { .. } => None,
        }
    }

    pub fn challenge_detected(&self) -> bool {
        matches!(
            self.http(),
            Some(HttpOutcome::Responded {
                challenge: true,
                ..
            })
        )
    }

    /// Flat, serializable snapshot for JSON output.
    pub fn record(&self) -> CheckRecord<'_> {
        CheckRecord {
            group: self.group(),
            original_text: self.original_text(),
            url: self.url(),
            dns_ip: self.dns_ip().map(|ip| ip.to_string()),
            dns_error: self.dns_error(),
            dns_latency_ms: self.dns_latency().map(millis),
            tcp_ok: self.tcp_ok(),
            tcp_error: self.tcp_error(),
            tcp_latency_ms: self.tcp_latency().map(millis),
            http_status: self.http_status(),
            http_error: self.http_error(),
            http_latency_ms: self.http_latency().map(millis),
            challenge_detected: self.challenge_detected(),
        }
    }
}

/// Flat view of a [`CheckResult`], latencies in milliseconds.
#[derive(Debug, Serialize)]
pub struct CheckRecord<'a> {
    pub group: &'a str,
    pub original_text: &'a str,
    pub url: &'a str,
    pub dns_ip: Option<String>,
    pub dns_error: Option<&'a str>,
    pub dns_latency_ms: Option<f64>,
    pub tcp_ok: Option<bool>,
    pub tcp_error: Option<&'a str>,
    pub tcp_latency_ms: Option<f64>,
    pub http_status: Option<u16>,
    pub http_error: Option<&'a str>,
    pub http_latency_ms: Option<f64>,
    pub challenge_detected: bool,
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> TargetEntry {
        TargetEntry::new("A", "https://good.example")
    }

    #[test]
    fn test_dns_failure_leaves_downstream_empty() {
        let result = CheckResult::dns_failed(entry(), "lookup failed");

        assert_eq!(result.dns_ip(), None);
        assert_eq!(result.dns_error(), Some("lookup failed"));
        assert_eq!(result.tcp_ok(), None);
        assert_eq!(result.tcp_error(), None);
        assert_eq!(result.http_status(), None);
        assert_eq!(result.http_error(), None);
        assert!(!result.challenge_detected());
    }

    #[test]
    fn test_completed_exposes_every_stage() {
        let result = CheckResult::completed(
            entry(),
            Ipv4Addr::new(93, 184, 216, 34),
            Duration::from_millis(12),
            TcpOutcome::Failed {
                error: "connection refused".to_string(),
            },
            HttpOutcome::Responded {
                status: 200,
                challenge: true,
                latency: Duration::from_millis(80),
            },
        );

        assert_eq!(result.dns_ip(), Some(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(result.tcp_ok(), Some(false));
        assert_eq!(result.tcp_error(), Some("connection refused"));
        assert_eq!(result.tcp_latency(), None);
        assert_eq!(result.http_status(), Some(200));
        assert_eq!(result.http_latency(), Some(Duration::from_millis(80)));
        assert!(result.challenge_detected());
    }

    #[test]
    fn test_record_serializes_flat() {
        let result = CheckResult::dns_failed(entry(), "timed out after 3s");
        let json = serde_json::to_value(result.record()).unwrap();

        assert_eq!(json["group"], "A");
        assert_eq!(json["url"], "https://good.example");
        assert_eq!(json["dns_error"], "timed out after 3s");
        assert!(json["dns_ip"].is_null());
        assert!(json["tcp_ok"].is_null());
        assert_eq!(json["challenge_detected"], false);
    }
}
