// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for per-page enhancement and its reporting.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one enhancement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// States of the per-page enhancement state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStage {
    Pending,
    /// Structural encode of the page is in flight.
    Encoding,
    /// Text payload has been extracted from the structural document.
    Extracted,
    /// Waiting on the correction service (possibly retrying).
    Correcting,
    DiffReceived,
    Merging,
    /// Merged structure is being turned back into a PDF page.
    Reconstructing,
    Done,
    /// Original page retained.
    Fallback,
}

impl std::fmt::Display for PageStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Encoding => "encoding",
            Self::Extracted => "extracted",
            Self::Correcting => "correcting",
            Self::DiffReceived => "diff-received",
            Self::Merging => "merging",
            Self::Reconstructing => "reconstructing",
            Self::Done => "done",
            Self::Fallback => "fallback",
        };
        f.write_str(label)
    }
}

/// Terminal result of processing one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageOutcome {
    /// Diff merged and the rebuilt page was appended.
    Enhanced,
    /// No stream text on the page; the correction service was not called.
    SkippedNoText,
    /// Service proposed no change.
    SkippedEmptyDiff,
    FallbackConversionFailed,
    FallbackExtractionFailed,
    FallbackServiceFailed,
    FallbackMergeFailed,
    FallbackReconstructionFailed,
}

impl PageOutcome {
    pub fn is_enhanced(&self) -> bool {
        matches!(self, Self::Enhanced)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedNoText | Self::SkippedEmptyDiff)
    }

    /// Any outcome that retained the original page because a stage failed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::FallbackConversionFailed
                | Self::FallbackExtractionFailed
                | Self::FallbackServiceFailed
                | Self::FallbackMergeFailed
                | Self::FallbackReconstructionFailed
        )
    }
}

/// Per-page line of the enhancement report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-based page number.
    pub page_number: u32,
    pub outcome: PageOutcome,
    /// Stage the page was in when its state machine terminated.
    pub final_stage: PageStage,
    /// Correction-service attempts made (0 when the service was never called).
    pub attempts: u32,
    pub elapsed: Duration,
    /// Display form of the error that caused a fallback, if any.
    pub error: Option<String>,
}

/// Aggregate result of enhancing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementReport {
    pub run_id: RunId,
    pub output_path: PathBuf,
    /// SHA-256 of the input file, lowercase hex.
    pub input_sha256: Option<String>,
    pub total: usize,
    pub enhanced: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Page reports in original page order.
    pub pages: Vec<PageReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Output is a verbatim copy of the input (no service, or assembly failed).
    pub copied_verbatim: bool,
}

impl EnhancementReport {
    pub fn new(output_path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            output_path,
            input_sha256: None,
            total: 0,
            enhanced: 0,
            failed: 0,
            skipped: 0,
            pages: Vec::new(),
            started_at: now,
            finished_at: now,
            copied_verbatim: false,
        }
    }

    /// Record one page, keeping the aggregate counts in step.
    pub fn record(&mut self, page: PageReport) {
        self.total += 1;
        if page.outcome.is_enhanced() {
            self.enhanced += 1;
        } else if page.outcome.is_failure() {
            self.failed += 1;
        } else if page.outcome.is_skipped() {
            self.skipped += 1;
        }
        self.pages.push(page);
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Outcomes in page order.
    pub fn outcomes(&self) -> Vec<PageOutcome> {
        self.pages.iter().map(|p| p.outcome).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page_number: u32, outcome: PageOutcome) -> PageReport {
        PageReport {
            page_number,
            outcome,
            final_stage: if outcome.is_enhanced() {
                PageStage::Done
            } else {
                PageStage::Fallback
            },
            attempts: 0,
            elapsed: Duration::ZERO,
            error: None,
        }
    }

    #[test]
    fn record_updates_counts() {
        let mut report = EnhancementReport::new(PathBuf::from("out.pdf"));
        report.record(page(1, PageOutcome::Enhanced));
        report.record(page(2, PageOutcome::SkippedNoText));
        report.record(page(3, PageOutcome::FallbackServiceFailed));

        assert_eq!(report.total, 3);
        assert_eq!(report.enhanced, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            report.outcomes(),
            vec![
                PageOutcome::Enhanced,
                PageOutcome::SkippedNoText,
                PageOutcome::FallbackServiceFailed
            ]
        );
    }

    #[test]
    fn reports_get_distinct_run_ids() {
        let a = EnhancementReport::new(PathBuf::from("a.pdf"));
        let b = EnhancementReport::new(PathBuf::from("b.pdf"));
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.run_id.to_string().len(), 36);
    }

    #[test]
    fn skipped_pages_are_not_failures() {
        assert!(PageOutcome::SkippedEmptyDiff.is_skipped());
        assert!(!PageOutcome::SkippedEmptyDiff.is_failure());
        assert!(PageOutcome::FallbackMergeFailed.is_failure());
        assert!(!PageOutcome::Enhanced.is_skipped());
    }
}
