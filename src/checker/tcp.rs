// src/checker/tcp.rs
// Stage 2: can we open a TCP connection to host:port at all?
// The host is looked up again through the batch's shared resolver (answers
// usually come from its cache) and the lookup counts toward the timeout.
// The connection is closed again right away.

use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};

use super::dns::DnsResolver;
use super::error::ProbeError;
use super::result::TcpOutcome;
use super::retry::Backoff;

pub async fn probe_tcp(
    resolver: &DnsResolver,
    host: &str,
    port: u16,
    limit: Duration,
    backoff: &Backoff,
) -> TcpOutcome {
    match backoff
        .run("tcp", || connect_once(resolver, host, port, limit))
        .await
    {
        Ok(latency) => TcpOutcome::Connected { latency },
        Err(e) => TcpOutcome::Failed {
            error: e.to_string(),
        },
    }
}

async fn connect_once(
    resolver: &DnsResolver,
    host: &str,
    port: u16,
    limit: Duration,
) -> Result<Duration, ProbeError> {
    let start = Instant::now();

    let connect = async {
        let ip = resolver.first_ipv4(host).await?;
        TcpStream::connect((ip, port))
            .await
            .map_err(ProbeError::Connect)
    };
    let mut stream = timeout(limit, connect)
        .await
        .map_err(|_| ProbeError::Timeout(limit))??;
    let latency = start.elapsed();

    // The peer may already have hung up; that doesn't change the verdict
    let _ = stream.shutdown().await;

    Ok(latency)
}
