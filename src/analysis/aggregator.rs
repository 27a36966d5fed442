//! Finding aggregation and ranking.
//!
//! This module runs the detector set in its fixed order, concatenates the
//! results, and provides helpers for ranking and grouping findings for
//! presentation.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use tracing::{debug, info};

use super::detectors::DETECTORS;
use crate::models::{Finding, FindingKind, Record, Severity};

/// Runs the detectors over a borrowed record set.
///
/// Holds no findings of its own: every call to [`Aggregator::analyze`]
/// returns a fresh sequence.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    records: &'a [Record],
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator over the given records.
    pub fn new(records: &'a [Record]) -> Self {
        Self { records }
    }

    /// Run content, timing, origin and volume detection, in that order.
    pub fn analyze(&self) -> Vec<Finding> {
        self.analyze_at(Local::now())
    }

    /// Same as [`Aggregator::analyze`], stamping findings with `now`.
    pub fn analyze_at(&self, now: DateTime<Local>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for entry in &DETECTORS {
            let emitted = (entry.detector)(self.records, now);
            debug!("Detector '{}' emitted {} findings", entry.name, emitted.len());
            findings.extend(emitted);
        }

        info!(
            "Analysis complete: {} findings across {} records",
            findings.len(),
            self.records.len()
        );
        findings
    }
}

/// Analyze a record set with a throwaway aggregator.
pub fn analyze(records: &[Record]) -> Vec<Finding> {
    Aggregator::new(records).analyze()
}

/// Sort findings by severity (high first), keeping emission order on ties.
pub fn rank_by_severity(findings: &mut [Finding]) {
    // sort_by is stable; report output depends on that
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Return a severity-ranked copy of the findings.
pub fn ranked(findings: &[Finding]) -> Vec<Finding> {
    let mut sorted = findings.to_vec();
    rank_by_severity(&mut sorted);
    sorted
}

/// Get the top N findings by severity.
pub fn top_findings(findings: &[Finding], n: usize) -> Vec<Finding> {
    let mut sorted = ranked(findings);
    sorted.truncate(n);
    sorted
}

/// Keep only findings at or above `min`.
pub fn filter_min_severity(findings: &[Finding], min: Severity) -> Vec<Finding> {
    findings
        .iter()
        .filter(|f| f.severity >= min)
        .cloned()
        .collect()
}

/// Group findings by detector kind.
pub fn group_by_kind(findings: &[Finding]) -> HashMap<FindingKind, Vec<Finding>> {
    let mut grouped: HashMap<FindingKind, Vec<Finding>> = HashMap::new();

    for finding in findings {
        grouped.entry(finding.kind).or_default().push(finding.clone());
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::make_record;
    use crate::models::RecordRef;

    fn create_test_finding(kind: FindingKind, severity: Severity, id: &str) -> Finding {
        Finding {
            kind,
            description: format!("finding for {}", id),
            record: RecordRef::Attributed(id.to_string()),
            severity,
            detected_at: Local::now(),
        }
    }

    #[test]
    fn test_analyze_empty() {
        assert!(analyze(&[]).is_empty());
    }

    #[test]
    fn test_detector_order() {
        let mut records = vec![make_record(
            "x",
            "CRITICAL: Account will be SUSPENDED",
            "a@evil.com",
            23,
        )];
        records.extend((0..6).map(|i| make_record(&format!("s{}", i), "hi", "spam@x.com", 10)));

        let kinds: Vec<_> = analyze(&records).iter().map(|f| f.kind).collect();

        assert_eq!(kinds[0], FindingKind::SuspiciousKeywords);
        assert_eq!(kinds[1], FindingKind::AfterHours);
        assert!(kinds[2..9].iter().all(|k| *k == FindingKind::ExternalSource));
        assert_eq!(kinds[9], FindingKind::HighVolumeSender);
        assert_eq!(kinds.len(), 10);
    }

    #[test]
    fn test_scenario_volume_sender() {
        let records: Vec<_> = (0..6)
            .map(|i| {
                let mut r = make_record(&format!("m{}", i), "Project status update", "spam@x.com", 10);
                r.recipient = format!("user{}@company.com", i);
                r
            })
            .collect();

        let findings = analyze(&records);
        let grouped = group_by_kind(&findings);

        assert_eq!(grouped.get(&FindingKind::HighVolumeSender).map(Vec::len), Some(1));
        assert_eq!(grouped.get(&FindingKind::ExternalSource).map(Vec::len), Some(6));
        assert!(grouped.get(&FindingKind::SuspiciousKeywords).is_none());
        assert!(grouped.get(&FindingKind::AfterHours).is_none());
        assert_eq!(findings.len(), 7);
    }

    #[test]
    fn test_scenario_urgent_external() {
        let mut record = make_record("p1", "CRITICAL: Account will be SUSPENDED", "a@evil.com", 11);
        record.body = "Immediate action required".to_string();

        let findings = analyze(&[record]);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].kind, FindingKind::SuspiciousKeywords);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[1].kind, FindingKind::ExternalSource);
        assert_eq!(findings[1].severity, Severity::Low);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let records = vec![
            make_record("1", "Bitcoin investment opportunity", "winner@lottery-scam.org", 2),
            make_record("2", "Q3 budget review", "john.smith@company.com", 9),
        ];
        let aggregator = Aggregator::new(&records);
        let now = Local::now();

        let first = aggregator.analyze_at(now);
        let second = aggregator.analyze_at(now);

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_rank_by_severity_is_stable() {
        let mut findings = vec![
            create_test_finding(FindingKind::ExternalSource, Severity::Low, "a"),
            create_test_finding(FindingKind::AfterHours, Severity::Medium, "b"),
            create_test_finding(FindingKind::SuspiciousKeywords, Severity::High, "c"),
            create_test_finding(FindingKind::SuspiciousKeywords, Severity::Medium, "d"),
            create_test_finding(FindingKind::ExternalSource, Severity::Low, "e"),
        ];

        rank_by_severity(&mut findings);

        let ids: Vec<_> = findings.iter().filter_map(|f| f.record.record_id()).collect();
        assert_eq!(ids, vec!["c", "b", "d", "a", "e"]);
    }

    #[test]
    fn test_top_findings() {
        let findings = vec![
            create_test_finding(FindingKind::ExternalSource, Severity::Low, "a"),
            create_test_finding(FindingKind::SuspiciousKeywords, Severity::High, "b"),
            create_test_finding(FindingKind::AfterHours, Severity::Medium, "c"),
        ];

        let top = top_findings(&findings, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].severity, Severity::High);
        assert_eq!(top[1].severity, Severity::Medium);
    }

    #[test]
    fn test_filter_min_severity() {
        let findings = vec![
            create_test_finding(FindingKind::ExternalSource, Severity::Low, "a"),
            create_test_finding(FindingKind::SuspiciousKeywords, Severity::High, "a"),
            create_test_finding(FindingKind::AfterHours, Severity::Medium, "b"),
        ];

        let kept = filter_min_severity(&findings, Severity::Medium);

        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|f| f.severity >= Severity::Medium));
        assert_eq!(kept[0].kind, FindingKind::SuspiciousKeywords);
    }
}
