//! Synthetic message generation.
//!
//! Produces reproducible test corpora with a controlled share of
//! suspicious messages, and writes them in the loader's file format.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime, Timelike};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::models::Record;

const NORMAL_SUBJECTS: &[&str] = &[
    "Weekly team meeting agenda",
    "Project status update",
    "Meeting minutes from yesterday",
    "Q3 budget review",
    "Employee handbook update",
    "Training session reminder",
    "Office closure notification",
    "System maintenance window",
    "New hire introduction",
    "Company newsletter",
];

const SUSPICIOUS_SUBJECTS: &[&str] = &[
    "URGENT: Account verification required",
    "Confidential: Payment processing error",
    "CRITICAL: Security breach detected",
    "Winner notification - Claim your prize",
    "Immediate action required - Account suspended",
    "Bitcoin investment opportunity",
    "Inheritance fund transfer",
    "Phishing attempt detected",
    "Download invoice immediately",
    "Secret project information",
];

const NORMAL_BODIES: &[&str] = &[
    "Please find the meeting agenda attached. Let me know if you have any questions.",
    "The project is progressing well. Here's the current status update for your review.",
    "Training session scheduled for next week. Please confirm your attendance.",
    "Budget review meeting moved to Thursday. Updated calendar invite sent.",
    "Welcome to our new team member. Please join us for the introduction meeting.",
];

const SUSPICIOUS_BODIES: &[&str] = &[
    "Your account will be suspended unless you verify immediately. Click here to download the verification form.",
    "Congratulations! You've won $1,000,000 in our secret lottery. Transfer processing fee required.",
    "CRITICAL security breach detected. Download the attached file to secure your account.",
    "Confidential inheritance fund of $5,000,000 available. Bitcoin payment preferred.",
    "Your payment is overdue. Click here to download invoice and avoid account suspension.",
];

const INTERNAL_SENDERS: &[&str] = &[
    "fabian.narel@company.com",
    "john.smith@company.com",
    "jane.doe@company.com",
    "contact@company.com",
    "marketing@company.com",
    "sales@company.com",
];

const EXTERNAL_SENDERS: &[&str] = &[
    "admin@phishing-site.com",
    "noreply@suspicious-bank.net",
    "winner@lottery-scam.org",
    "security@fake-company.com",
    "support@malicious-site.org",
];

const RECIPIENTS: &[&str] = &[
    "fabian.narel@company.com",
    "john.smith@company.com",
    "jane.doe@company.com",
    "contact@company.com",
    "hr@company.com",
    "it@company.com",
];

/// Hours used for suspicious messages sent after hours.
const AFTER_HOURS: &[u32] = &[2, 3, 22, 23];

/// Chance that a suspicious message is sent after hours.
const AFTER_HOURS_PROBABILITY: f64 = 0.4;

/// Messages are spread over this many days before `now`.
const DAY_SPREAD: i64 = 30;

/// Timestamp layout written to message files.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generator for synthetic message corpora.
pub struct Generator {
    rng: StdRng,
}

impl Generator {
    /// Create a generator. The same seed always yields the same corpus.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn pick(&mut self, options: &[&'static str]) -> &'static str {
        options.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Generate `count` records; the first `floor(count * ratio)` are suspicious.
    ///
    /// Records are placed in `dir` by their `origin_path` but nothing is
    /// written; see [`write_records`].
    pub fn generate(
        &mut self,
        count: usize,
        suspicious_ratio: f64,
        now: NaiveDateTime,
        dir: &Path,
    ) -> Vec<Record> {
        let suspicious_count = (count as f64 * suspicious_ratio.clamp(0.0, 1.0)) as usize;
        let mut records = Vec::with_capacity(count);

        for i in 0..count {
            let suspicious = i < suspicious_count;

            let (subject, body, sender) = if suspicious {
                (
                    self.pick(SUSPICIOUS_SUBJECTS),
                    self.pick(SUSPICIOUS_BODIES),
                    self.pick(EXTERNAL_SENDERS),
                )
            } else {
                (
                    self.pick(NORMAL_SUBJECTS),
                    self.pick(NORMAL_BODIES),
                    self.pick(INTERNAL_SENDERS),
                )
            };

            let hour = if suspicious && self.rng.gen_bool(AFTER_HOURS_PROBABILITY) {
                AFTER_HOURS.choose(&mut self.rng).copied().unwrap_or(2)
            } else {
                self.rng.gen_range(8..=18)
            };

            let offset = Duration::days(self.rng.gen_range(0..=DAY_SPREAD))
                + Duration::hours(self.rng.gen_range(0..=23))
                + Duration::minutes(self.rng.gen_range(0..=59));
            let shifted = now - offset;
            let timestamp = shifted
                .with_hour(hour)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(shifted);

            let id = format!("email_{:03}", i + 1);
            let origin_path = dir.join(format!("{}.txt", id));

            records.push(Record {
                id,
                subject: subject.to_string(),
                sender: sender.to_string(),
                recipient: self.pick(RECIPIENTS).to_string(),
                timestamp,
                body: body.to_string(),
                origin_path: origin_path.to_string_lossy().to_string(),
            });
        }

        info!(
            "Generated {} messages ({} suspicious)",
            count, suspicious_count
        );
        records
    }
}

/// Render a record in the `Key: Value` message file format.
pub fn format_record(record: &Record) -> String {
    format!(
        "ID: {}\nSubject: {}\nFrom: {}\nTo: {}\nDate: {}\nContent: {}\n",
        record.id,
        record.subject,
        record.sender,
        record.recipient,
        record.timestamp.format(DATE_FORMAT),
        record.body
    )
}

/// Write each record to its `origin_path`, creating `dir` first.
pub fn write_records(dir: &Path, records: &[Record], show_progress: bool) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(records.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    for record in records {
        let path = Path::new(&record.origin_path);
        fs::write(path, format_record(record))
            .with_context(|| format!("Failed to write message file {}", path.display()))?;
        debug!("Wrote {}", path.display());

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Generation complete");
    }

    Ok(())
}
