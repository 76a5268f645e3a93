// src/targets/normalize.rs
// =============================================================================
// URL normalization for hand-written input files.
//
// People type URLs in all sorts of shapes: missing schemes, spaces around
// the port colon, garbage ports. We clean up what we can and reject only
// text that has no hostname at all. Text that names a host but still isn't a
// valid URL ("exa mple.com") is kept, so it shows up as a DNS failure in the
// report instead of vanishing.
//
// Steps:
// 1. Trim and collapse whitespace runs; reject empty input
// 2. Remove spaces around ':'
// 3. Add "https://" if no http(s) scheme is present
// 4. If the port can't be parsed, drop it (keep the path) and parse again
// 5. Reject anything without a host part
// =============================================================================

use url::{ParseError, Url};

// Normalizes raw URL text into a scheme-qualified URL string
//
// Returns None when the text has no hostname. The returned string keeps the
// operator's spelling (no trailing slash is added) and is not guaranteed to
// parse: the pipeline reports unparsable ones as DNS failures.
//
// Example:
//   normalize_url("example.com")        -> Some("https://example.com")
//   normalize_url(" foo.com : 8080 ")   -> Some("https://foo.com:8080")
//   normalize_url("exa mple.com")       -> Some("https://exa mple.com")
//   normalize_url("::::")               -> None
pub fn normalize_url(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let cleaned = collapsed.replace(" :", ":").replace(": ", ":");

    let candidate = if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
        cleaned
    } else {
        format!("https://{}", cleaned)
    };

    match Url::parse(&candidate) {
        Ok(parsed) => has_host(&parsed).then_some(candidate),
        Err(ParseError::InvalidPort) => drop_port(&candidate),
        Err(_) => host_part(&candidate).is_some().then_some(candidate),
    }
}

// Port used for the TCP stage when the URL doesn't name one
//
// `Url::port()` already hides the scheme's default port, so this only has to
// fill in 443 for https and 80 for everything else.
pub fn default_port(url: &Url) -> u16 {
    url.port()
        .unwrap_or(if url.scheme() == "https" { 443 } else { 80 })
}

fn has_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| !host.is_empty())
}

// Splits "scheme://authority/rest" after the scheme separator
fn split_authority(candidate: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = candidate.split_once("://")?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some((scheme, &rest[..authority_end], &rest[authority_end..]))
}

// The host text of a URL the `url` crate refused, if there is one
fn host_part(candidate: &str) -> Option<&str> {
    let (_, authority, _) = split_authority(candidate)?;

    // user:pass@host:port -> host:port
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    let host = if host_port.starts_with('[') {
        // IPv6 literal: keep everything up to the closing bracket
        let close = host_port.find(']')?;
        &host_port[..=close]
    } else {
        host_port.split(':').next().unwrap_or("")
    };

    (!host.is_empty()).then_some(host)
}

// Rebuilds "scheme://host/path" without the broken port
//
// Query and fragment are dropped along with the port, only the path survives.
fn drop_port(candidate: &str) -> Option<String> {
    let (scheme, _, after_authority) = split_authority(candidate)?;
    let host = host_part(candidate)?;

    let path_end = after_authority
        .find(['?', '#'])
        .unwrap_or(after_authority.len());
    let path = &after_authority[..path_end];

    Some(format!("{}://{}{}", scheme, host, path))
}
