//! Corpus statistics.
//!
//! Raw counts over records and findings, plus the data series behind the
//! report's activity tables. Nothing here divides by the record count;
//! percentages are left to presentation code.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::models::{Finding, Record, Severity};

/// Summary counts for one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_records: usize,
    /// Records whose subject or body matched the risk vocabulary.
    pub flagged_count: usize,
    pub external_count: usize,
    pub off_hours_count: usize,
    pub total_findings: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
}

impl Statistics {
    /// Number of findings at the given severity.
    pub fn count_for(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high_count,
            Severity::Medium => self.medium_count,
            Severity::Low => self.low_count,
        }
    }
}

/// Compute summary counts. Pure; identical inputs give identical output.
pub fn summarize(records: &[Record], findings: &[Finding]) -> Statistics {
    let mut stats = Statistics {
        total_records: records.len(),
        total_findings: findings.len(),
        ..Statistics::default()
    };

    for record in records {
        if record.is_flagged_content() {
            stats.flagged_count += 1;
        }
        if record.is_external() {
            stats.external_count += 1;
        }
        if record.is_off_hours() {
            stats.off_hours_count += 1;
        }
    }

    for finding in findings {
        match finding.severity {
            Severity::High => stats.high_count += 1,
            Severity::Medium => stats.medium_count += 1,
            Severity::Low => stats.low_count += 1,
        }
    }

    stats
}

/// Messages per hour of day.
pub fn hourly_distribution(records: &[Record]) -> [usize; 24] {
    let mut hours = [0usize; 24];
    for record in records {
        hours[record.timestamp.hour() as usize] += 1;
    }
    hours
}

/// Messages per weekday and hour. Row 0 is Monday, column is the hour.
pub fn weekday_hour_matrix(records: &[Record]) -> [[usize; 24]; 7] {
    let mut matrix = [[0usize; 24]; 7];
    for record in records {
        let day = record.timestamp.weekday().num_days_from_monday() as usize;
        matrix[day][record.timestamp.hour() as usize] += 1;
    }
    matrix
}

/// Messages per calendar day, in date order.
pub fn daily_counts(records: &[Record]) -> BTreeMap<NaiveDate, usize> {
    let mut days = BTreeMap::new();
    for record in records {
        *days.entry(record.timestamp.date()).or_default() += 1;
    }
    days
}

/// Count keys, most frequent first; ties keep first-appearance order.
fn most_common<K, I>(keys: I, n: usize) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut order: Vec<K> = Vec::new();
    let mut counts: HashMap<K, usize> = HashMap::new();

    for key in keys {
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let mut ranked: Vec<(K, usize)> = order
        .into_iter()
        .map(|k| {
            let count = counts.get(&k).copied().unwrap_or(0);
            (k, count)
        })
        .collect();

    ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ranked.truncate(n);
    ranked
}

/// The `n` most active senders.
pub fn top_senders(records: &[Record], n: usize) -> Vec<(String, usize)> {
    most_common(records.iter().map(|r| r.sender.clone()), n)
}

/// Domain after the last `@`, or the whole address when there is none.
fn connection_domain(address: &str) -> &str {
    address
        .rsplit_once('@')
        .map_or(address, |(_, domain)| domain)
}

/// The `n` most frequent sender domain to recipient domain pairs.
pub fn top_connections(records: &[Record], n: usize) -> Vec<((String, String), usize)> {
    most_common(
        records.iter().map(|r| {
            (
                connection_domain(&r.sender).to_string(),
                connection_domain(&r.recipient).to_string(),
            )
        }),
        n,
    )
}
