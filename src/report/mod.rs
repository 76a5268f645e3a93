// src/report/mod.rs
// =============================================================================
// Turns finished CheckResults into verdicts and per-group totals.
//
// - classify: ok / warning / failure for one result (derived, never stored)
// - summarize: counts of each verdict per group label
// - BatchReport: results + summary, the snapshot every renderer reads
//
// Submodules:
// - output: Terminal and JSON rendering
// =============================================================================

mod output;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::checker::{Batch, CheckRecord, CheckResult};

pub use output::{print_report, OutputFormat};

/// Verdict for one checked target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    /// A challenge / captcha page was served
    Warning,
    /// DNS, TCP or HTTP failed, or HTTP returned an error status
    Failure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Ok => "ok",
            Outcome::Warning => "warning",
            Outcome::Failure => "failure",
        };
        f.write_str(label)
    }
}

// Classifies a result, first matching rule wins:
// 1. challenge detected     -> warning (even on a 200)
// 2. no DNS answer          -> failure
// 3. TCP connect failed     -> failure
// 4. HTTP status >= 400     -> failure
// 5. HTTP never got a status -> failure
// 6. otherwise              -> ok
pub fn classify(result: &CheckResult) -> Outcome {
    if result.challenge_detected() {
        return Outcome::Warning;
    }
    if result.dns_ip().is_none() {
        return Outcome::Failure;
    }
    if result.tcp_ok() == Some(false) {
        return Outcome::Failure;
    }
    match result.http_status() {
        Some(status) if status >= 400 => Outcome::Failure,
        Some(_) => Outcome::Ok,
        None => Outcome::Failure,
    }
}

/// Verdict counts for one group label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub ok: usize,
    pub warning: usize,
    pub failure: usize,
}

impl GroupSummary {
    pub fn total(&self) -> usize {
        self.ok + self.warning + self.failure
    }

    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Ok => self.ok += 1,
            Outcome::Warning => self.warning += 1,
            Outcome::Failure => self.failure += 1,
        }
    }
}

// Counts verdicts per group
//
// Result order doesn't matter; the map is keyed (and iterated) by group name.
pub fn summarize(results: &[CheckResult]) -> BTreeMap<String, GroupSummary> {
    let mut summary: BTreeMap<String, GroupSummary> = BTreeMap::new();
    for result in results {
        summary
            .entry(result.group().to_string())
            .or_default()
            .add(classify(result));
    }
    summary
}

/// Everything renderers need from a finished batch.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<CheckResult>,
    pub summary: BTreeMap<String, GroupSummary>,
    pub interrupted: bool,
}

impl BatchReport {
    pub fn totals(&self) -> GroupSummary {
        self.summary
            .values()
            .fold(GroupSummary::default(), |acc, group| GroupSummary {
                ok: acc.ok + group.ok,
                warning: acc.warning + group.warning,
                failure: acc.failure + group.failure,
            })
    }

    /// True when any target is not `ok`.
    pub fn has_problems(&self) -> bool {
        let totals = self.totals();
        totals.warning + totals.failure > 0
    }

    // Serializable view; `error_only` drops the `ok` rows (the summary keeps them)
    pub fn to_json_view(&self, error_only: bool) -> JsonReport<'_> {
        JsonReport {
            interrupted: self.interrupted,
            totals: self.totals(),
            summary: &self.summary,
            results: self
                .results
                .iter()
                .map(|result| (result, classify(result)))
                .filter(|(_, outcome)| !error_only || *outcome != Outcome::Ok)
                .map(|(result, outcome)| JsonResult {
                    outcome,
                    record: result.record(),
                })
                .collect(),
        }
    }
}

impl From<Batch> for BatchReport {
    fn from(batch: Batch) -> Self {
        let summary = summarize(&batch.results);
        Self {
            results: batch.results,
            summary,
            interrupted: batch.interrupted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub interrupted: bool,
    pub totals: GroupSummary,
    pub summary: &'a BTreeMap<String, GroupSummary>,
    pub results: Vec<JsonResult<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonResult<'a> {
    pub outcome: Outcome,
    #[serde(flatten)]
    pub record: CheckRecord<'a>,
}
