// src/report/output.rs
// =============================================================================
// Prints a finished batch, either for humans or as JSON.
//
// Human output has three parts:
// 1. One block per checked target (what was tested and how each stage went)
// 2. A per-group table of ok / warning / failure counts
// 3. Overall totals
//
// Everything goes to stdout; logs go to stderr, so `--json | jq` works.
// =============================================================================

use anyhow::Result;
use std::fmt::{self, Write as _};
use std::time::Duration;

use super::{classify, BatchReport, Outcome};
use crate::checker::{CheckResult, DnsOutcome, HttpOutcome, TcpOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

// Prints the report in the requested format
pub fn print_report(report: &BatchReport, format: OutputFormat, error_only: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json_output = serde_json::to_string_pretty(&report.to_json_view(error_only))?;
            println!("{}", json_output);
        }
        OutputFormat::Text => print!("{}", render_text(report, error_only)?),
    }
    Ok(())
}

// Builds the human-readable report as one string
fn render_text(report: &BatchReport, error_only: bool) -> Result<String, fmt::Error> {
    let mut out = String::new();

    for result in &report.results {
        let outcome = classify(result);
        if error_only && outcome == Outcome::Ok {
            continue;
        }
        render_result(&mut out, result, outcome)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "#".repeat(60))?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", "#".repeat(60))?;
    writeln!(out, "{:<40} {:>6} {:>8} {:>8}", "GROUP", "OK", "WARN", "FAIL")?;
    writeln!(out, "{}", "=".repeat(65))?;
    for (group, counts) in &report.summary {
        writeln!(
            out,
            "{:<40} {:>6} {:>8} {:>8}",
            truncate(group, 40),
            counts.ok,
            counts.warning,
            counts.failure
        )?;
    }

    let totals = report.totals();
    writeln!(out)?;
    writeln!(out, "📊 Summary:")?;
    writeln!(out, "   {} OK: {}", icon(Outcome::Ok), totals.ok)?;
    writeln!(out, "   {} Challenged: {}", icon(Outcome::Warning), totals.warning)?;
    writeln!(out, "   {} Failed: {}", icon(Outcome::Failure), totals.failure)?;
    writeln!(out, "   📋 Total: {}", totals.total())?;
    if report.interrupted {
        writeln!(out, "   ⚠️  Interrupted: some targets were not checked")?;
    }

    Ok(out)
}

fn render_result(out: &mut String, result: &CheckResult, outcome: Outcome) -> fmt::Result {
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "{} {}", icon(outcome), result.group())?;
    writeln!(out, "Original: {}", result.original_text())?;
    writeln!(out, "Tested:   {}", result.url())?;

    match result.dns() {
        DnsOutcome::Resolved { ip, latency } => {
            writeln!(out, "DNS:      {} ({})", ip, format_latency(latency))?;
        }
        DnsOutcome::Failed { error } => {
            writeln!(out, "DNS:      failed: {}", error)?;
        }
    }

    match result.tcp() {
        Some(TcpOutcome::Connected { latency }) => {
            writeln!(out, "TCP:      connected ({})", format_latency(*latency))?;
        }
        Some(TcpOutcome::Failed { error }) => {
            writeln!(out, "TCP:      failed: {}", error)?;
        }
        None => {
            writeln!(out, "TCP:      skipped")?;
        }
    }

    match result.http() {
        Some(HttpOutcome::Responded {
            status,
            challenge,
            latency,
        }) => {
            writeln!(out, "HTTP:     {} ({})", status, format_latency(*latency))?;
            if *challenge {
                writeln!(out, "Challenge: detected")?;
            }
        }
        Some(HttpOutcome::Failed { error }) => {
            writeln!(out, "HTTP:     failed: {}", error)?;
        }
        None => {
            writeln!(out, "HTTP:     skipped")?;
        }
    }

    Ok(())
}

fn icon(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Ok => "🟢",
        Outcome::Warning => "🤖",
        Outcome::Failure => "🔴",
    }
}

fn format_latency(latency: Duration) -> String {
    format!("{:.0} ms", latency.as_secs_f64() * 1000.0)
}

// Truncate long group labels so the table stays aligned
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Batch;
    use crate::targets::TargetEntry;
    use std::net::Ipv4Addr;

    fn sample_report() -> BatchReport {
        let ok = CheckResult::completed(
            TargetEntry::new("AK (Alaska): www.commerce.alaska.gov", "https://good.example"),
            Ipv4Addr::new(10, 0, 0, 1),
            Duration::from_millis(4),
            TcpOutcome::Connected {
                latency: Duration::from_millis(9),
            },
            HttpOutcome::Responded {
                status: 200,
                challenge: false,
                latency: Duration::from_millis(120),
            },
        );
        let failed = CheckResult::dns_failed(
            TargetEntry::new("AK (Alaska): www.commerce.alaska.gov", "https://nonexistent.invalid"),
            "lookup failed: failed to lookup address information",
        );

        BatchReport::from(Batch {
            results: vec![ok, failed],
            interrupted: false,
        })
    }

    #[test]
    fn test_text_report_lists_every_result() {
        let text = render_text(&sample_report(), false).unwrap();

        assert!(text.contains("Tested:   https://good.example"));
        assert!(text.contains("HTTP:     200 (120 ms)"));
        assert!(text.contains("Tested:   https://nonexistent.invalid"));
        assert!(text.contains("TCP:      skipped"));
        assert!(text.contains("📋 Total: 2"));
    }

    #[test]
    fn test_text_report_error_only() {
        let text = render_text(&sample_report(), true).unwrap();

        assert!(!text.contains("Tested:   https://good.example"));
        assert!(text.contains("Tested:   https://nonexistent.invalid"));
        // The summary still counts the hidden ok row
        assert!(text.contains("🟢 OK: 1"));
    }

    #[test]
    fn test_truncate_long_labels() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long group label", 10), "a very ...");
    }
}
