//! Heuristic detectors.
//!
//! Each detector is a pure function over the full record set that returns
//! zero or more findings. Detectors never read each other's output, and
//! each one owns its severity policy.

use chrono::{DateTime, Local};
use std::collections::HashMap;

use crate::models::{Finding, FindingKind, Record, RecordRef, Severity};

/// Senders with strictly more messages than this are flagged.
pub const VOLUME_THRESHOLD: usize = 5;

/// Function signature shared by every detector.
pub type DetectorFn = fn(&[Record], DateTime<Local>) -> Vec<Finding>;

/// A named detector.
pub struct DetectorEntry {
    pub name: &'static str,
    pub detector: DetectorFn,
}

/// The fixed detector set, in execution order.
pub const DETECTORS: [DetectorEntry; 4] = [
    DetectorEntry {
        name: "content",
        detector: detect_suspicious_content,
    },
    DetectorEntry {
        name: "timing",
        detector: detect_after_hours,
    },
    DetectorEntry {
        name: "origin",
        detector: detect_external_source,
    },
    DetectorEntry {
        name: "volume",
        detector: detect_high_volume_senders,
    },
];

fn attributed(
    record: &Record,
    kind: FindingKind,
    severity: Severity,
    description: String,
    now: DateTime<Local>,
) -> Finding {
    Finding {
        kind,
        description,
        record: RecordRef::Attributed(record.id.clone()),
        severity,
        detected_at: now,
    }
}

// ---------------------------------------------------------------------------
// Detector 1: Content
// ---------------------------------------------------------------------------

/// Flags records whose subject or body contains risk vocabulary.
///
/// Escalates to `High` when the subject line alone carries an urgency term,
/// regardless of which term triggered the flag.
pub fn detect_suspicious_content(records: &[Record], now: DateTime<Local>) -> Vec<Finding> {
    records
        .iter()
        .filter(|r| r.is_flagged_content())
        .map(|r| {
            let severity = if r.has_urgent_subject() {
                Severity::High
            } else {
                Severity::Medium
            };
            attributed(
                r,
                FindingKind::SuspiciousKeywords,
                severity,
                format!(
                    "Email contains suspicious keywords: {} [{}]",
                    r.subject,
                    r.matched_terms().join(", ")
                ),
                now,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Detector 2: Timing
// ---------------------------------------------------------------------------

/// Flags records sent outside business hours.
pub fn detect_after_hours(records: &[Record], now: DateTime<Local>) -> Vec<Finding> {
    records
        .iter()
        .filter(|r| r.is_off_hours())
        .map(|r| {
            attributed(
                r,
                FindingKind::AfterHours,
                Severity::Medium,
                format!(
                    "Email sent outside business hours: {}",
                    r.timestamp.format("%H:%M")
                ),
                now,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Detector 3: Origin
// ---------------------------------------------------------------------------

/// Flags records from senders outside the internal domains.
pub fn detect_external_source(records: &[Record], now: DateTime<Local>) -> Vec<Finding> {
    records
        .iter()
        .filter(|r| r.is_external())
        .map(|r| {
            attributed(
                r,
                FindingKind::ExternalSource,
                Severity::Low,
                format!("Email from external domain: {}", r.sender),
                now,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Detector 4: Volume
// ---------------------------------------------------------------------------

/// Flags each sender with more than [`VOLUME_THRESHOLD`] messages.
///
/// Senders are grouped by exact string and reported in order of first
/// appearance. One corpus-level finding per sender.
pub fn detect_high_volume_senders(records: &[Record], now: DateTime<Local>) -> Vec<Finding> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let count = counts.entry(record.sender.as_str()).or_insert(0);
        if *count == 0 {
            order.push(record.sender.as_str());
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|sender| {
            let count = counts.get(sender).copied().unwrap_or(0);
            (count > VOLUME_THRESHOLD).then(|| Finding {
                kind: FindingKind::HighVolumeSender,
                description: format!("Sender {} has {} emails in dataset", sender, count),
                record: RecordRef::CorpusLevel,
                severity: Severity::Medium,
                detected_at: now,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::make_record;

    #[test]
    fn test_empty_records_produce_no_findings() {
        let now = Local::now();
        for entry in &DETECTORS {
            assert!((entry.detector)(&[], now).is_empty(), "{}", entry.name);
        }
    }

    #[test]
    fn test_content_severity_escalation() {
        let records = vec![
            make_record("1", "URGENT: Account verification required", "a@evil.com", 10),
            make_record("2", "Download invoice immediately", "a@evil.com", 10),
            make_record("3", "Weekly team meeting agenda", "a@company.com", 10),
        ];

        let findings = detect_suspicious_content(&records, Local::now());

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].record, RecordRef::Attributed("1".into()));
        assert_eq!(findings[1].severity, Severity::Medium);
        assert!(findings[1].description.contains("Download invoice"));
        assert!(findings[1]
            .description
            .ends_with("[immediate, download, invoice]"));
    }

    #[test]
    fn test_after_hours_description_has_time() {
        let records = vec![
            make_record("1", "hi", "a@company.com", 22),
            make_record("2", "hi", "a@company.com", 18),
        ];

        let findings = detect_after_hours(&records, Local::now());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::AfterHours);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert!(findings[0].description.ends_with("22:30"));
    }

    #[test]
    fn test_external_source_is_low() {
        let records = vec![
            make_record("1", "hi", "admin@phishing-site.com", 10),
            make_record("2", "hi", "jane@company.com", 10),
        ];

        let findings = detect_external_source(&records, Local::now());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Low);
        assert!(findings[0].description.contains("admin@phishing-site.com"));
    }

    #[test]
    fn test_volume_threshold_is_strict() {
        let five: Vec<_> = (0..5)
            .map(|i| make_record(&i.to_string(), "hi", "bulk@x.com", 10))
            .collect();
        assert!(detect_high_volume_senders(&five, Local::now()).is_empty());

        let mut six = five.clone();
        six.push(make_record("5", "hi", "bulk@x.com", 10));
        let findings = detect_high_volume_senders(&six, Local::now());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].record, RecordRef::CorpusLevel);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert!(findings[0].description.contains("bulk@x.com"));
        assert!(findings[0].description.contains('6'));
    }

    #[test]
    fn test_volume_groups_by_exact_sender() {
        let mut records: Vec<_> = (0..6)
            .map(|i| make_record(&format!("a{}", i), "hi", "no-at-sign", 10))
            .collect();
        records.extend((0..6).map(|i| make_record(&format!("b{}", i), "hi", "Bulk@x.com", 10)));
        records.extend((0..3).map(|i| make_record(&format!("c{}", i), "hi", "bulk@x.com", 10)));

        let findings = detect_high_volume_senders(&records, Local::now());

        assert_eq!(findings.len(), 2);
        assert!(findings[0].description.contains("no-at-sign"));
        assert!(findings[1].description.contains("Bulk@x.com"));
    }
}
