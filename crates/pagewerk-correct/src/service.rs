// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Correction service capability.

use async_trait::async_trait;
use pagewerk_core::error::Result;

/// An external text-improvement provider.
///
/// `enhance_pdf_structure` takes a page's extracted text and answers with
/// unified-diff text. An empty or whitespace-only answer means "no change
/// proposed". Failures are reported as `ServiceError`; timeouts and retries
/// are the caller's business.
#[async_trait]
pub trait CorrectionService: Send + Sync {
    /// Provider name for logs and reports.
    fn name(&self) -> &str;

    async fn enhance_pdf_structure(&self, text: &str) -> Result<String>;

    /// Probe whether the provider can be used right now.
    async fn is_available(&self) -> bool;
}
