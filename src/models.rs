//! Data models for the forensics pipeline.
//!
//! This module contains the message record with its derived risk
//! predicates, and the finding types emitted by the detectors.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-insensitive substrings that mark a message as flagged content.
pub const RISK_TERMS: &[&str] = &[
    "confidential",
    "secret",
    "critical",
    "account",
    "payment",
    "transfer",
    "urgent",
    "immediate",
    "verify",
    "suspend",
    "click here",
    "download",
    "invoice",
    "refund",
    "winner",
    "congratulations",
    "inheritance",
    "million",
    "dollars",
    "bitcoin",
    "cryptocurrency",
    "phishing",
];

/// Subject-line terms that escalate a content finding to high severity.
pub const URGENCY_TERMS: &[&str] = &["urgent", "critical", "suspend"];

/// Sender domains treated as internal.
pub const INTERNAL_DOMAINS: &[&str] = &["company.com", "internal.org"];

/// First hour of the business day.
pub const BUSINESS_START_HOUR: u32 = 8;

/// Last hour of the business day (inclusive).
pub const BUSINESS_END_HOUR: u32 = 18;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity - context-dependent signals such as external senders
    Low,
    /// Medium severity - suspicious content, timing or volume
    Medium,
    /// High severity - urgency pressure in the subject line
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🔴",
        }
    }

    /// All severities, highest first.
    pub const DESCENDING: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];
}

/// The detector that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    SuspiciousKeywords,
    AfterHours,
    ExternalSource,
    HighVolumeSender,
}

impl FindingKind {
    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::SuspiciousKeywords => "Suspicious Keywords",
            FindingKind::AfterHours => "After Hours Communication",
            FindingKind::ExternalSource => "External Communication",
            FindingKind::HighVolumeSender => "High Volume Sender",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a finding is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRef {
    /// A single record, by id.
    Attributed(String),
    /// The corpus as a whole; no single record is responsible.
    CorpusLevel,
}

impl RecordRef {
    /// Returns the record id, or `None` for corpus-level findings.
    pub fn record_id(&self) -> Option<&str> {
        match self {
            RecordRef::Attributed(id) => Some(id),
            RecordRef::CorpusLevel => None,
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Attributed(id) => write!(f, "{}", id),
            RecordRef::CorpusLevel => write!(f, "multiple"),
        }
    }
}

/// One message, as handed over by the loader or the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier, unique within a batch (not enforced here).
    pub id: String,
    pub subject: String,
    /// Sender address, expected as `local@domain` but not validated.
    pub sender: String,
    pub recipient: String,
    /// Local, timezone-naive send time.
    pub timestamp: NaiveDateTime,
    pub body: String,
    /// Where the record came from, e.g. a file path.
    pub origin_path: String,
}

impl Record {
    fn searchable_text(&self) -> String {
        format!("{} {}", self.subject, self.body).to_lowercase()
    }

    /// True if subject or body contains any risk term, ignoring case.
    pub fn is_flagged_content(&self) -> bool {
        let text = self.searchable_text();
        RISK_TERMS.iter().any(|term| text.contains(term))
    }

    /// Risk terms present in subject or body, in vocabulary order.
    pub fn matched_terms(&self) -> Vec<&'static str> {
        let text = self.searchable_text();
        RISK_TERMS
            .iter()
            .copied()
            .filter(|term| text.contains(term))
            .collect()
    }

    /// True if the subject line alone carries an urgency term.
    pub fn has_urgent_subject(&self) -> bool {
        let subject = self.subject.to_lowercase();
        URGENCY_TERMS.iter().any(|term| subject.contains(term))
    }

    /// True outside the business window; hours 8 through 18 are business hours.
    pub fn is_off_hours(&self) -> bool {
        let hour = self.timestamp.hour();
        hour < BUSINESS_START_HOUR || hour > BUSINESS_END_HOUR
    }

    /// Domain after the last `@`, or empty when the sender has none.
    pub fn sender_domain(&self) -> &str {
        match self.sender.rfind('@') {
            Some(idx) => &self.sender[idx + 1..],
            None => "",
        }
    }

    /// True unless the sender domain is on the internal allow-list.
    ///
    /// A sender without `@` has an empty domain and is therefore external.
    pub fn is_external(&self) -> bool {
        !INTERNAL_DOMAINS.contains(&self.sender_domain())
    }
}

/// A single detector result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Human-readable description, may embed record detail.
    pub description: String,
    pub record: RecordRef,
    pub severity: Severity,
    /// When the finding was produced, not when the message was sent.
    pub detected_at: DateTime<Local>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn at_hour(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .and_then(|d| d.and_hms_opt(hour, 30, 0))
            .unwrap()
    }

    pub(crate) fn make_record(id: &str, subject: &str, sender: &str, hour: u32) -> Record {
        Record {
            id: id.to_string(),
            subject: subject.to_string(),
            sender: sender.to_string(),
            recipient: "hr@company.com".to_string(),
            timestamp: at_hour(hour),
            body: "Please find the agenda attached.".to_string(),
            origin_path: format!("output/emails/{}.txt", id),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_severity_emoji() {
        assert_eq!(Severity::High.emoji(), "🔴");
        assert_eq!(Severity::Medium.emoji(), "🟡");
        assert_eq!(Severity::Low.emoji(), "🟢");
    }

    #[test]
    fn test_flagged_content_is_case_insensitive() {
        let upper = make_record("a", "URGENT update", "x@company.com", 10);
        let lower = make_record("b", "urgent update", "x@company.com", 10);
        assert!(upper.is_flagged_content());
        assert_eq!(upper.is_flagged_content(), lower.is_flagged_content());
    }

    #[test]
    fn test_flagged_content_matches_substrings_in_body() {
        let mut record = make_record("a", "Weekly team meeting agenda", "x@company.com", 10);
        assert!(!record.is_flagged_content());

        record.body = "Re-accounting for Q3".to_string();
        assert!(record.is_flagged_content());
        assert_eq!(record.matched_terms(), vec!["account"]);
    }

    #[test]
    fn test_urgent_subject_ignores_body() {
        let mut record = make_record("a", "Invoice attached", "x@company.com", 10);
        record.body = "This is urgent".to_string();
        assert!(record.is_flagged_content());
        assert!(!record.has_urgent_subject());
    }

    #[test]
    fn test_off_hours_boundaries() {
        let flagged = |hour| make_record("a", "hi", "x@company.com", hour).is_off_hours();
        assert!(flagged(0));
        assert!(flagged(7));
        assert!(!flagged(8));
        assert!(!flagged(12));
        assert!(!flagged(18));
        assert!(flagged(19));
        assert!(flagged(23));
    }

    #[test]
    fn test_is_external() {
        assert!(!make_record("a", "hi", "jane.doe@company.com", 10).is_external());
        assert!(!make_record("a", "hi", "ops@internal.org", 10).is_external());
        assert!(make_record("a", "hi", "admin@phishing-site.com", 10).is_external());
    }

    #[test]
    fn test_is_external_without_at_sign() {
        let record = make_record("a", "hi", "no-at-sign", 10);
        assert_eq!(record.sender_domain(), "");
        assert!(record.is_external());
    }

    #[test]
    fn test_sender_domain_uses_last_at() {
        let record = make_record("a", "hi", "\"odd@name\"@company.com", 10);
        assert_eq!(record.sender_domain(), "company.com");
        assert!(!record.is_external());
    }

    #[test]
    fn test_predicates_are_stable() {
        let record = make_record("a", "CRITICAL alert", "a@evil.com", 22);
        let snapshot = record.clone();
        for _ in 0..2 {
            assert!(record.is_flagged_content());
            assert!(record.is_off_hours());
            assert!(record.is_external());
        }
        assert_eq!(record, snapshot);
    }

    #[test]
    fn test_record_ref_display() {
        assert_eq!(RecordRef::Attributed("email_001".into()).to_string(), "email_001");
        assert_eq!(RecordRef::CorpusLevel.to_string(), "multiple");
        assert_eq!(RecordRef::CorpusLevel.record_id(), None);
    }
}
