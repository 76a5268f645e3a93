// src/checker/http.rs
// =============================================================================
// Stage 3: fetch the page over HTTP(S).
//
// Every attempt:
// 1. Waits its turn at the shared pacing limiter (anti-burst)
// 2. Takes a slot in the HTTP pool (at most `concurrency` requests in flight)
// 3. Picks a fresh browser-like header set (rotating User-Agent and
//    Accept-Language so we don't look like one script hammering the site)
// 4. Sends a GET and reads the whole body (bad UTF-8 is replaced, not fatal)
// 5. Looks for captcha / bot-check markers in the body and headers
//
// Redirects are followed (up to 10), so the status we record is the one of
// the final page.
//
// Rust concepts:
// - One reqwest Client for the whole batch: it's a connection pool that is
//   cheap to share by reference
// - tokio::sync::Semaphore: caps how many requests run at once
// =============================================================================

use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use super::challenge::{detect_challenge, flatten_headers};
use super::error::ProbeError;
use super::pacing::PacingLimiter;
use super::result::HttpOutcome;
use super::retry::Backoff;

/// User-Agent strings the HTTP stage rotates through.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.2 Mobile/15E148 Safari/604.1",
];

/// Accept-Language values the HTTP stage rotates through.
pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-US,en;q=0.7,es;q=0.3",
    "en;q=0.9,fr;q=0.5",
];

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const MAX_REDIRECTS: usize = 10;

// Builds a header set for one attempt
//
// Picks one entry from each pool, nothing else is remembered between calls.
pub fn browser_headers<R: Rng + ?Sized>(rng: &mut R) -> HeaderMap {
    let user_agent = USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]);
    let language = ACCEPT_LANGUAGES
        .choose(rng)
        .copied()
        .unwrap_or(ACCEPT_LANGUAGES[0]);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(language));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers
}

/// The HTTP stage, shared by every pipeline in a batch.
#[derive(Debug)]
pub struct HttpProbe {
    client: Client,
    pool: Semaphore,
    pacing: PacingLimiter,
    timeout: Duration,
    backoff: Backoff,
}

impl HttpProbe {
    // Creates the client and the pool for one batch
    //
    // This is the only fallible part of setting up a batch.
    pub fn new(
        concurrency: usize,
        timeout: Duration,
        ssl_verify: bool,
        pacing: PacingLimiter,
        backoff: Backoff,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .pool_max_idle_per_host(concurrency)
            .danger_accept_invalid_certs(!ssl_verify)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            pool: Semaphore::new(concurrency.max(1)),
            pacing,
            timeout,
            backoff,
        })
    }

    // Fetches `url` under the retry policy
    pub async fn probe(&self, url: &str) -> HttpOutcome {
        match self.backoff.run("http", || self.fetch_once(url)).await {
            Ok((status, challenge, latency)) => HttpOutcome::Responded {
                status,
                challenge,
                latency,
            },
            Err(e) => HttpOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<(u16, bool, Duration), ProbeError> {
        self.pacing.acquire().await;
        let _slot = self
            .pool
            .acquire()
            .await
            .map_err(|_| ProbeError::PoolClosed)?;

        let headers = browser_headers(&mut rand::rng());

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.classify(e, ProbeError::Request))?;

        let status = response.status().as_u16();
        let header_text = flatten_headers(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify(e, ProbeError::Body))?;
        let body = String::from_utf8_lossy(&bytes);

        let challenge = detect_challenge(&body, &header_text);
        Ok((status, challenge, start.elapsed()))
    }

    // Timeouts get the same short description as the other stages
    fn classify(&self, error: reqwest::Error, wrap: fn(reqwest::Error) -> ProbeError) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else {
            wrap(error)
        }
    }
}
