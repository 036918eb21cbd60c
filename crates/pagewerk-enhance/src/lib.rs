// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-enhance: Per-page PDF structure enhancement.
//
// Opens the input with `lopdf`, drives every page through the structural
// codec and the correction service, and assembles an output document that
// holds either the rebuilt or the original version of each page.

pub mod integrity;
pub mod orchestrator;
pub mod pdf;
pub mod pipeline;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{PageEnhancementOrchestrator, PageResult};
pub use pdf::{OutputAssembler, SourcePdf};
pub use pipeline::{copy_verbatim, enhance_file, enhance_with_fallback};
pub use retry::{RetryConfig, RetryDecision};
