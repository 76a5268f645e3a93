// src/checker/mod.rs
// =============================================================================
// This module contains the probing engine.
//
// Submodules:
// - dns / tcp / http: The three probe stages
// - retry: Exponential backoff shared by all stages
// - pacing: Global spacing between HTTP attempts
// - challenge: Captcha / bot-check detection
// - result: Stage outcomes and the final CheckResult
// - pipeline: Runs the stages per target and the whole batch concurrently
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod challenge;
mod dns;
mod error;
mod http;
mod pacing;
mod pipeline;
mod result;
mod retry;
mod tcp;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export public items from submodules
pub use pipeline::{Batch, Checker};
pub use result::{CheckRecord, CheckResult, DnsOutcome, HttpOutcome, TcpOutcome};
