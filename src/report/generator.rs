//! Report generation.
//!
//! This module builds a report from an analysis run and renders it as
//! plain text, Markdown, or JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::analysis::{
    daily_counts, filter_min_severity, group_by_kind, hourly_distribution, ranked,
    top_connections, top_senders, weekday_hour_matrix, Statistics,
};
use crate::models::{Finding, FindingKind, Record, Severity};

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Local>,
    /// Where the messages were loaded from.
    pub source: String,
    /// Number of message files that failed to load.
    pub files_failed: usize,
    /// Wall-clock duration of loading and analysis in seconds.
    pub duration_seconds: f64,
}

/// One sender domain to recipient domain pair and its message count.
///
/// An address without `@` stands in as its own domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub sender_domain: String,
    pub recipient_domain: String,
    pub count: usize,
}

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Activity data series shown next to the statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySeries {
    /// Messages per hour of day, index 0 through 23.
    pub hourly: Vec<usize>,
    /// Messages per weekday (Monday first) and hour.
    pub weekday_hourly: [[usize; 24]; 7],
    pub daily: BTreeMap<NaiveDate, usize>,
    pub top_senders: Vec<(String, usize)>,
    pub top_connections: Vec<Connection>,
}

impl ActivitySeries {
    /// Compute the series for a record set.
    pub fn from_records(records: &[Record], top_n: usize) -> Self {
        Self {
            hourly: hourly_distribution(records).to_vec(),
            weekday_hourly: weekday_hour_matrix(records),
            daily: daily_counts(records),
            top_senders: top_senders(records, top_n),
            top_connections: top_connections(records, top_n)
                .into_iter()
                .map(|((sender_domain, recipient_domain), count)| Connection {
                    sender_domain,
                    recipient_domain,
                    count,
                })
                .collect(),
        }
    }
}

/// Options controlling what goes into a report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Findings below this severity are left out of the findings list.
    pub min_severity: Option<Severity>,
    /// Number of entries in the top-N tables.
    pub top_n: usize,
    pub include_data_series: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            min_severity: None,
            top_n: 5,
            include_data_series: true,
        }
    }
}

/// The complete forensics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Counts over the full record and finding sets.
    pub statistics: Statistics,
    /// Findings ranked by severity, after the severity filter.
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySeries>,
}

impl Report {
    /// Assemble a report. Statistics always cover every finding; the
    /// severity filter only trims the listed findings.
    pub fn build(
        metadata: ReportMetadata,
        records: &[Record],
        findings: &[Finding],
        statistics: Statistics,
        options: &ReportOptions,
    ) -> Self {
        let listed = match options.min_severity {
            Some(min) => filter_min_severity(findings, min),
            None => findings.to_vec(),
        };

        Self {
            metadata,
            statistics,
            findings: ranked(&listed),
            activity: options
                .include_data_series
                .then(|| ActivitySeries::from_records(records, options.top_n)),
        }
    }
}

/// `part` as a percentage of `whole`, or `None` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

fn format_percentage(part: usize, whole: usize) -> String {
    match percentage(part, whole) {
        Some(pct) => format!("{:.1}%", pct),
        None => "n/a".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// Generate the plain text report.
pub fn generate_text_report(report: &Report) -> String {
    let stats = &report.statistics;
    let mut output = String::new();

    output.push_str("EMAIL FORENSICS ANALYSIS REPORT\n");
    output.push_str("================================\n");
    output.push_str(&format!(
        "Generated: {}\n",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str(&format!("Source: {}\n\n", report.metadata.source));

    output.push_str("EXECUTIVE SUMMARY\n");
    output.push_str("-----------------\n");
    output.push_str(&format!("Total Emails Analyzed: {}\n", stats.total_records));
    output.push_str(&format!(
        "Suspicious Emails: {} ({})\n",
        stats.flagged_count,
        format_percentage(stats.flagged_count, stats.total_records)
    ));
    output.push_str(&format!("External Communications: {}\n", stats.external_count));
    output.push_str(&format!(
        "After-Hours Communications: {}\n",
        stats.off_hours_count
    ));
    output.push_str(&format!("Total Security Findings: {}\n\n", stats.total_findings));

    output.push_str("FINDINGS BREAKDOWN\n");
    output.push_str("------------------\n");
    for severity in Severity::DESCENDING {
        output.push_str(&format!(
            "{} Severity: {}\n",
            severity,
            stats.count_for(severity)
        ));
    }
    output.push('\n');

    output.push_str("DETAILED FINDINGS\n");
    output.push_str("-----------------\n");
    if report.findings.is_empty() {
        output.push_str("No findings.\n");
    }
    for finding in &report.findings {
        output.push_str(&format!("\nFinding: {}\n", finding.kind));
        output.push_str(&format!("Severity: {}\n", finding.severity));
        output.push_str(&format!("Email ID: {}\n", finding.record));
        output.push_str(&format!("Description: {}\n", finding.description));
        output.push_str(&format!(
            "Timestamp: {}\n",
            finding.detected_at.format("%Y-%m-%d %H:%M:%S")
        ));
        output.push_str(&"=".repeat(50));
        output.push('\n');
    }

    output
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Email Forensics Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.statistics));
    output.push_str(&generate_detector_section(&report.findings));
    if let Some(ref activity) = report.activity {
        output.push_str(&generate_activity_section(activity));
    }
    output.push_str(&generate_findings_section(&report.findings));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    if metadata.files_failed > 0 {
        section.push_str(&format!("- **Files Failed:** {}\n", metadata.files_failed));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_summary_section(stats: &Statistics) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Emails | Suspicious | External | After Hours | Findings |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} ({}) | {} | {} | {} |\n\n",
        stats.total_records,
        stats.flagged_count,
        format_percentage(stats.flagged_count, stats.total_records),
        stats.external_count,
        stats.off_hours_count,
        stats.total_findings
    ));

    section.push_str("### Severity Breakdown\n\n");
    section.push_str(&format!(
        "| {} High | {} Medium | {} Low | **Total** |\n",
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        stats.high_count, stats.medium_count, stats.low_count, stats.total_findings
    ));

    section
}

fn generate_detector_section(findings: &[Finding]) -> String {
    let grouped = group_by_kind(findings);
    if grouped.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("### Findings by Detector\n\n");
    section.push_str("| Detector | Findings |\n");
    section.push_str("|:---|:---:|\n");
    for kind in [
        FindingKind::SuspiciousKeywords,
        FindingKind::AfterHours,
        FindingKind::ExternalSource,
        FindingKind::HighVolumeSender,
    ] {
        if let Some(listed) = grouped.get(&kind) {
            section.push_str(&format!("| {} | {} |\n", kind, listed.len()));
        }
    }
    section.push('\n');

    section
}

fn generate_activity_section(activity: &ActivitySeries) -> String {
    let mut section = String::new();

    section.push_str("## Activity\n\n");

    if !activity.top_senders.is_empty() {
        section.push_str("### Top Senders\n\n");
        section.push_str("| Sender | Emails |\n");
        section.push_str("|:---|:---:|\n");
        for (sender, count) in &activity.top_senders {
            section.push_str(&format!("| `{}` | {} |\n", sender, count));
        }
        section.push('\n');
    }

    if !activity.top_connections.is_empty() {
        section.push_str("### Top Connections\n\n");
        section.push_str("| From Domain | To Domain | Emails |\n");
        section.push_str("|:---|:---|:---:|\n");
        for conn in &activity.top_connections {
            section.push_str(&format!(
                "| `{}` | `{}` | {} |\n",
                conn.sender_domain, conn.recipient_domain, conn.count
            ));
        }
        section.push('\n');
    }

    let active_hours: Vec<_> = activity
        .hourly
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .collect();
    if !active_hours.is_empty() {
        section.push_str("### Hourly Activity\n\n");
        section.push_str("| Hour | Emails |\n");
        section.push_str("|:---:|:---:|\n");
        for (hour, count) in active_hours {
            section.push_str(&format!("| {:02}:00 | {} |\n", hour, count));
        }
        section.push('\n');
    }

    section.push_str(&generate_weekday_table(&activity.weekday_hourly));

    if !activity.daily.is_empty() {
        section.push_str("### Daily Activity\n\n");
        section.push_str("| Date | Emails |\n");
        section.push_str("|:---|:---:|\n");
        for (day, count) in &activity.daily {
            section.push_str(&format!("| {} | {} |\n", day.format("%Y-%m-%d"), count));
        }
        section.push('\n');
    }

    section
}

/// Weekday by hour table, limited to hours and days with any traffic.
fn generate_weekday_table(matrix: &[[usize; 24]; 7]) -> String {
    let hours: Vec<usize> = (0..24)
        .filter(|&hour| matrix.iter().any(|day| day[hour] > 0))
        .collect();
    if hours.is_empty() {
        return String::new();
    }

    let mut table = String::new();

    table.push_str("### Weekday Activity\n\n");
    table.push_str("| Day |");
    for hour in &hours {
        table.push_str(&format!(" {:02}:00 |", hour));
    }
    table.push_str("\n|:---|");
    table.push_str(&":---:|".repeat(hours.len()));
    table.push('\n');

    for (label, day) in WEEKDAY_LABELS.iter().zip(matrix) {
        if day.iter().all(|&count| count == 0) {
            continue;
        }
        table.push_str(&format!("| {} |", label));
        for &hour in &hours {
            match day[hour] {
                0 => table.push_str(" - |"),
                count => table.push_str(&format!(" {} |", count)),
            }
        }
        table.push('\n');
    }
    table.push('\n');

    table
}

fn generate_findings_section(findings: &[Finding]) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");

    if findings.is_empty() {
        section.push_str("No findings were raised for the analyzed emails.\n\n");
        return section;
    }

    for finding in findings {
        section.push_str(&generate_finding_block(finding));
    }

    section
}

fn generate_finding_block(finding: &Finding) -> String {
    let mut block = String::new();

    let severity_badge = match finding.severity {
        Severity::High => "🔴 **HIGH**",
        Severity::Medium => "🟡 **MEDIUM**",
        Severity::Low => "🟢 **LOW**",
    };

    block.push_str(&format!("#### {} {}\n\n", severity_badge, finding.kind));
    match finding.record.record_id() {
        Some(id) => block.push_str(&format!("**Email:** `{}`\n\n", id)),
        None => block.push_str("**Scope:** all emails\n\n"),
    }
    block.push_str(&format!("**Description:** {}\n\n", finding.description));
    block.push_str("---\n\n");

    block
}

fn generate_footer() -> String {
    "*Report generated by mailsift*\n".to_string()
}

// ---------------------------------------------------------------------------
// JSON and output
// ---------------------------------------------------------------------------

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content, creating parent directories.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, summarize};
    use crate::models::tests::make_record;
    use crate::models::FindingKind;
    use tempfile::TempDir;

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            generated_at: Local::now(),
            source: "output/emails".to_string(),
            files_failed: 1,
            duration_seconds: 0.5,
        }
    }

    fn create_test_report(options: &ReportOptions) -> Report {
        let records = vec![
            make_record("email_001", "CRITICAL: Security breach detected", "admin@phishing-site.com", 23),
            make_record("email_002", "Q3 budget review", "jane.doe@company.com", 10),
        ];
        let findings = analyze(&records);
        let stats = summarize(&records, &findings);
        Report::build(metadata(), &records, &findings, stats, options)
    }

    #[test]
    fn test_percentage_guards_zero() {
        assert_eq!(percentage(1, 0), None);
        assert_eq!(percentage(1, 4), Some(25.0));
    }

    #[test]
    fn test_build_ranks_findings() {
        let report = create_test_report(&ReportOptions::default());

        assert_eq!(report.findings.len(), 3);
        assert_eq!(report.findings[0].severity, Severity::High);
        assert_eq!(report.findings[1].kind, FindingKind::AfterHours);
        assert_eq!(report.findings[2].severity, Severity::Low);
    }

    #[test]
    fn test_min_severity_keeps_full_statistics() {
        let options = ReportOptions {
            min_severity: Some(Severity::Medium),
            ..ReportOptions::default()
        };

        let report = create_test_report(&options);

        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.statistics.total_findings, 3);
        assert_eq!(report.statistics.low_count, 1);
    }

    #[test]
    fn test_generate_text_report() {
        let report = create_test_report(&ReportOptions::default());
        let text = generate_text_report(&report);

        assert!(text.contains("EMAIL FORENSICS ANALYSIS REPORT"));
        assert!(text.contains("Total Emails Analyzed: 2"));
        assert!(text.contains("Suspicious Emails: 1 (50.0%)"));
        assert!(text.contains("High Severity: 1"));
        assert!(text.contains("Email ID: email_001"));
        let high = text.find("Severity: High").unwrap();
        let low = text.find("Severity: Low").unwrap();
        assert!(high < low);
    }

    #[test]
    fn test_text_report_with_no_records() {
        let report = Report::build(
            metadata(),
            &[],
            &[],
            Statistics::default(),
            &ReportOptions::default(),
        );
        let text = generate_text_report(&report);

        assert!(text.contains("Suspicious Emails: 0 (n/a)"));
        assert!(text.contains("No findings."));
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(&ReportOptions::default());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Email Forensics Report"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("### Top Senders"));
        assert!(markdown.contains("| 23:00 | 1 |"));
        assert!(markdown.contains("| Day | 10:00 | 23:00 |"));
        assert!(markdown.contains("| Thu | 1 | 1 |"));
        assert!(markdown.contains("| `company.com` | `company.com` | 1 |"));
        assert!(markdown.contains("| `phishing-site.com` | `company.com` | 1 |"));
        assert!(markdown.contains("**HIGH**"));
        assert!(markdown.contains("| After Hours Communication | 1 |"));
        assert!(markdown.contains("**Email:** `email_001`"));
        assert!(markdown.contains("Files Failed:"));
    }

    #[test]
    fn test_generate_json_report() {
        let options = ReportOptions {
            include_data_series: false,
            ..ReportOptions::default()
        };
        let report = create_test_report(&options);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"statistics\""));
        assert!(json.contains("\"suspicious_keywords\""));
        assert!(json.contains("\"attributed\": \"email_001\""));
        assert!(!json.contains("\"activity\""));
    }

    #[test]
    fn test_write_report_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reports").join("out.txt");

        write_report(&path, "hello").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }
}
