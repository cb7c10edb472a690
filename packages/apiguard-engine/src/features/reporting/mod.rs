/*
 * Finding Reporting
 *
 * Collects findings across rules and instances, deduplicates them by
 * (rule, location, onfail), and applies good-finding suppression at the
 * reporting boundary only. The tracker always computes the true
 * outcome; suppressed findings stay counted internally so consistency
 * checks see them.
 */

use crate::shared::models::{Finding, Span};
use serde::Serialize;
use std::collections::HashSet;

/// Internal counters over everything the collector saw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    /// Violations collected
    pub problems: usize,

    /// Confirmations collected (before suppression)
    pub good: usize,

    /// Duplicates dropped by the dedup key
    pub duplicates: usize,

    /// Good findings filtered at the boundary
    pub suppressed: usize,

    /// Rules skipped because their order expression failed to compile
    pub skipped_rules: usize,
}

/// Insertion-ordered, deduplicating finding collector
#[derive(Debug, Default)]
pub struct FindingCollector {
    findings: Vec<Finding>,
    seen: HashSet<(String, Option<Span>, String)>,
    stats: ReportStats,
}

impl FindingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finding unless its dedup key was already seen
    pub fn add(&mut self, finding: Finding) {
        if !self.seen.insert(finding.dedup_key()) {
            self.stats.duplicates += 1;
            return;
        }
        if finding.is_problem() {
            self.stats.problems += 1;
        } else {
            self.stats.good += 1;
        }
        self.findings.push(finding);
    }

    pub fn add_all(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// Record a rule skipped due to a construction error
    pub fn record_skipped_rule(&mut self) {
        self.stats.skipped_rules += 1;
    }

    pub fn stats(&self) -> &ReportStats {
        &self.stats
    }

    /// Findings collected so far, unfiltered
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Hand findings to the reporting boundary
    ///
    /// `disable_good_findings` filters confirmations here and nowhere
    /// earlier; the counts keep reflecting what was computed.
    pub fn into_report(mut self, disable_good_findings: bool) -> Report {
        let findings = if disable_good_findings {
            let before = self.findings.len();
            let kept: Vec<Finding> = self
                .findings
                .drain(..)
                .filter(Finding::is_problem)
                .collect();
            self.stats.suppressed = before - kept.len();
            kept
        } else {
            self.findings
        };
        Report {
            findings,
            stats: self.stats,
        }
    }
}

/// Final result handed to the reporting layer
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
    pub stats: ReportStats,
}

impl Report {
    pub fn has_problems(&self) -> bool {
        self.findings.iter().any(Finding::is_problem)
    }

    /// JSON array of findings, the shape the external reporter consumes
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.findings)
    }
}
