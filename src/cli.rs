// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every tuning flag is optional: when a flag is missing, the value from the
// --config file (or the built-in default) is used instead.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::PartialConfig;

#[derive(Parser, Debug)]
#[command(
    name = "site-sentinel",
    version,
    about = "Checks DNS, TCP and HTTP health for long lists of URLs",
    long_about = "site-sentinel reads a list of URLs grouped by label, checks that each one \
                  resolves, accepts TCP connections and serves a non-error page, and flags \
                  captcha / bot-check pages. Requests are paced to avoid tripping rate limits."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every "Full URL:" line in an input file
    ///
    /// Example: site-sentinel check urls.txt --concurrency 50 --json
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Input file with group lines and "Full URL:" lines
    pub input: PathBuf,

    /// TOML file with default settings (flags override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum HTTP requests in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Retries per stage after the first attempt
    #[arg(long)]
    pub retries: Option<u32>,

    /// Minimum seconds between HTTP attempts across the whole batch
    #[arg(long = "rate-limit", value_name = "SECONDS")]
    pub rate_limit_delay: Option<f64>,

    /// Maximum random extra seconds added when pacing kicks in
    #[arg(long = "jitter", value_name = "SECONDS")]
    pub jitter_max: Option<f64>,

    /// DNS timeout per attempt, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub dns_timeout: Option<f64>,

    /// TCP connect timeout per attempt, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub tcp_timeout: Option<f64>,

    /// HTTP timeout per attempt, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub http_timeout: Option<f64>,

    /// Don't verify TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Only show targets that are not OK
    #[arg(long)]
    pub errors_only: bool,

    /// Output results in JSON format instead of text
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    // The flags as a config layer; boolean switches only count when given
    pub fn overrides(&self) -> PartialConfig {
        PartialConfig {
            concurrency: self.concurrency,
            retries: self.retries,
            dns_timeout: self.dns_timeout,
            tcp_timeout: self.tcp_timeout,
            http_timeout: self.http_timeout,
            rate_limit_delay: self.rate_limit_delay,
            jitter_max: self.jitter_max,
            backoff_jitter: None,
            ssl_verify: self.insecure.then_some(false),
            error_only: self.errors_only.then_some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CheckArgs {
        match Cli::parse_from(args).command {
            Commands::Check(args) => args,
        }
    }

    #[test]
    fn test_minimal_invocation() {
        let args = parse(&["site-sentinel", "check", "urls.txt"]);
        assert_eq!(args.input, PathBuf::from("urls.txt"));
        assert!(!args.json);

        let layer = args.overrides();
        assert_eq!(layer.concurrency, None);
        assert_eq!(layer.ssl_verify, None);
        assert_eq!(layer.error_only, None);
    }

    #[test]
    fn test_flags_become_overrides() {
        let args = parse(&[
            "site-sentinel",
            "check",
            "urls.txt",
            "--concurrency",
            "50",
            "--retries",
            "1",
            "--rate-limit",
            "0.5",
            "--insecure",
            "--errors-only",
        ]);

        let layer = args.overrides();
        assert_eq!(layer.concurrency, Some(50));
        assert_eq!(layer.retries, Some(1));
        assert_eq!(layer.rate_limit_delay, Some(0.5));
        assert_eq!(layer.ssl_verify, Some(false));
        assert_eq!(layer.error_only, Some(true));
    }
}
