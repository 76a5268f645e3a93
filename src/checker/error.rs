// src/checker/error.rs
// Errors a single probe attempt can hit. They never leave the checker: each
// stage turns its last error into a description string on the CheckResult.

use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("lookup failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("no IPv4 address found for {0}")]
    NoIpv4Address(String),

    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("reading body failed: {0}")]
    Body(#[source] reqwest::Error),

    #[error("HTTP pool closed")]
    PoolClosed,
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ProbeError::Timeout(_) => true,
            ProbeError::Resolve(e) => matches!(e.kind(), ResolveErrorKind::Timeout),
            ProbeError::Request(e) | ProbeError::Body(e) => e.is_timeout(),
            _ => false,
        }
    }
}
