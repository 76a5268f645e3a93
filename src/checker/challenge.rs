// src/checker/challenge.rs
// =============================================================================
// Detects captcha / bot-check / rate-limit pages.
//
// This is a plain keyword match over the response body and headers. We don't
// try to solve or get past the challenge, we only flag that one was served so
// the report can show it as a warning instead of a healthy site.
// =============================================================================

use reqwest::header::HeaderMap;

/// Substrings that mark a challenge page. All lower-case.
pub const CHALLENGE_MARKERS: &[&str] = &[
    "captcha",
    "recaptcha",
    "hcaptcha",
    "cloudflare",
    "/cdn-cgi/challenge-platform",
    "cf-chl",
    "access denied",
    "rate limit",
    "too many requests",
    "human verification",
    "security check",
];

// Returns true if any marker appears in the body or the flattened headers
//
// Both inputs are lower-cased here, so callers can pass them as received.
pub fn detect_challenge(body: &str, headers: &str) -> bool {
    let body = body.to_lowercase();
    let headers = headers.to_lowercase();

    CHALLENGE_MARKERS
        .iter()
        .any(|marker| body.contains(marker) || headers.contains(marker))
}

// Flattens headers into "key:value key:value ..." for keyword matching
//
// Values that aren't valid visible ASCII are skipped.
pub fn flatten_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| format!("{}:{}", name.as_str(), value).to_lowercase())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
