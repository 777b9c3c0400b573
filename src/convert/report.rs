//! Conversion report types.
//!
//! Every annotation file ends in exactly one [`FileOutcome`]; the report
//! folds those into counters plus a list of per-file issues so that nothing
//! skipped disappears silently.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::source::{DropCode, ObjectDrop};

/// Why a whole annotation file produced no output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No image shares the annotation's stem.
    MissingImage,
    /// The image exists but its dimensions could not be read.
    ImageDecodeFailure,
    /// The annotation file could not be read or parsed.
    MalformedContent,
    /// The output file could not be written.
    WriteFailure,
}

impl SkipReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, SkipReason::WriteFailure)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::MissingImage => "missing image",
            SkipReason::ImageDecodeFailure => "image decode failure",
            SkipReason::MalformedContent => "malformed content",
            SkipReason::WriteFailure => "write failure",
        })
    }
}

/// The result of converting one annotation file.
#[derive(Clone, Debug, PartialEq)]
pub enum FileOutcome {
    Written {
        stem: String,
        path: PathBuf,
        records: usize,
        drops: Vec<ObjectDrop>,
    },
    Skipped {
        stem: String,
        reason: SkipReason,
        message: String,
    },
}

impl FileOutcome {
    pub fn stem(&self) -> &str {
        match self {
            FileOutcome::Written { stem, .. } | FileOutcome::Skipped { stem, .. } => stem,
        }
    }
}

/// Counts over all files of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    /// Annotation files considered.
    pub files: usize,
    /// Output files written, empty ones included.
    pub written: usize,
    /// Output files written with zero records.
    pub empty: usize,
    /// Records written across all files.
    pub records: usize,
}

/// One file that produced no output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub stem: String,
    pub reason: SkipReason,
    pub message: String,
}

/// Aggregate outcome of a conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Source format name.
    pub format: String,
    pub counts: ConversionCounts,
    /// Dropped objects by reason.
    pub dropped: BTreeMap<DropCode, usize>,
    pub issues: Vec<FileIssue>,
}

impl ConversionReport {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Default::default()
        }
    }

    /// Folds one file outcome into the report.
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.counts.files += 1;
        match outcome {
            FileOutcome::Written { records, drops, .. } => {
                self.counts.written += 1;
                self.counts.records += records;
                if *records == 0 {
                    self.counts.empty += 1;
                }
                for drop in drops {
                    *self.dropped.entry(drop.code()).or_insert(0) += 1;
                }
            }
            FileOutcome::Skipped {
                stem,
                reason,
                message,
            } => self.issues.push(FileIssue {
                stem: stem.clone(),
                reason: *reason,
                message: message.clone(),
            }),
        }
    }

    /// Adds another report's counts and issues to this one.
    pub fn merge(&mut self, other: ConversionReport) {
        self.counts.files += other.counts.files;
        self.counts.written += other.counts.written;
        self.counts.empty += other.counts.empty;
        self.counts.records += other.counts.records;
        for (code, count) in other.dropped {
            *self.dropped.entry(code).or_insert(0) += count;
        }
        self.issues.extend(other.issues);
    }

    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.issues.iter().filter(|i| i.reason == reason).count()
    }

    pub fn dropped_count(&self, code: DropCode) -> usize {
        self.dropped.get(&code).copied().unwrap_or(0)
    }

    /// Files that failed hard (write failures). Any of these makes the run fail.
    pub fn failed_count(&self) -> usize {
        self.issues.iter().filter(|i| i.reason.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} annotation file(s): {} written ({} empty), {} record(s)",
            self.counts.files, self.counts.written, self.counts.empty, self.counts.records
        )?;

        if !self.dropped.is_empty() {
            let parts: Vec<String> = self
                .dropped
                .iter()
                .map(|(code, count)| format!("{count} {}", drop_label(*code)))
                .collect();
            writeln!(f, "  dropped objects: {}", parts.join(", "))?;
        }

        let failures = self.failed_count();
        let skipped = self.issues.len() - failures;

        if skipped > 0 {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", skipped)?;
            for issue in self.issues.iter().filter(|i| !i.reason.is_failure()) {
                writeln!(f, "  - {} [{}]: {}", issue.stem, issue.reason, issue.message)?;
            }
        }

        if failures > 0 {
            writeln!(f)?;
            writeln!(f, "Failed ({}):", failures)?;
            for issue in self.issues.iter().filter(|i| i.reason.is_failure()) {
                writeln!(f, "  - {}: {}", issue.stem, issue.message)?;
            }
        }

        Ok(())
    }
}

fn drop_label(code: DropCode) -> &'static str {
    match code {
        DropCode::UnknownCategory => "unknown category",
        DropCode::MissingBox => "missing box",
        DropCode::MalformedBox => "malformed box",
    }
}
