// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page enhancement orchestrator.
//
// Each page runs through encode -> extract -> correct -> merge -> rebuild.
// A failure at any stage keeps the original page and moves on; pages never
// affect one another. Pages are processed sequentially so the output document
// is only touched by one task.

use std::path::Path;
use std::time::{Duration, Instant};

use lopdf::{Document, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::{EnhanceConfig, EnhancementReport, PageOutcome, PageReport, PageStage};
use pagewerk_correct::CorrectionService;
use pagewerk_structure::{DiffMerger, StructuralCodec, StructuralDocument, TextStreamExtractor};
use tracing::{debug, info, instrument, warn};

use crate::pdf::{OutputAssembler, SourcePdf};
use crate::retry::{RetryConfig, retry_with_timeout};

/// A page's result: its report, plus the rebuilt single-page PDF when the
/// page was enhanced.
pub struct PageResult {
    pub report: PageReport,
    pub rebuilt: Option<Document>,
}

/// How a page's state machine stopped short of failure.
enum PageStep {
    Rebuilt(Document),
    Skipped(PageOutcome),
}

/// A stage failure and the fallback outcome it maps to.
struct PageFailure {
    outcome: PageOutcome,
    error: PagewerkError,
}

impl PageFailure {
    fn new(outcome: PageOutcome, error: PagewerkError) -> Self {
        Self { outcome, error }
    }
}

/// Drives per-page enhancement and assembles the output document.
pub struct PageEnhancementOrchestrator {
    codec: Box<dyn StructuralCodec>,
    service: Box<dyn CorrectionService>,
    encode_timeout: Duration,
    decode_timeout: Duration,
    max_page_text_chars: usize,
    retry: RetryConfig,
}

impl PageEnhancementOrchestrator {
    pub fn new(
        config: &EnhanceConfig,
        codec: Box<dyn StructuralCodec>,
        service: Box<dyn CorrectionService>,
    ) -> Self {
        Self {
            codec,
            service,
            encode_timeout: config.encode_timeout(),
            decode_timeout: config.decode_timeout(),
            max_page_text_chars: config.max_page_text_chars,
            retry: RetryConfig::from_config(config),
        }
    }

    // -- Document -------------------------------------------------------------

    /// Enhance every page of `source` and write the result to `output`.
    ///
    /// Only failing to assemble or save the output is an error; page-level
    /// failures are reported in the returned `EnhancementReport`.
    pub async fn enhance_document(
        &self,
        source: &SourcePdf,
        output: &Path,
    ) -> Result<EnhancementReport> {
        let mut report = EnhancementReport::new(output.to_path_buf());
        self.enhance_into(source, output, &mut report).await?;
        Ok(report)
    }

    /// Like [`Self::enhance_document`], recording pages into `report` so they
    /// survive a failed save.
    #[instrument(skip_all, fields(input = %source.path().display(), output = %output.display()))]
    pub async fn enhance_into(
        &self,
        source: &SourcePdf,
        output: &Path,
        report: &mut EnhancementReport,
    ) -> Result<()> {
        report.input_sha256 = Some(source.sha256().to_owned());
        let assembler = self.assemble(source, report).await?;
        assembler.save(output)?;
        report.finish();

        info!(
            run_id = %report.run_id,
            total = report.total,
            enhanced = report.enhanced,
            failed = report.failed,
            skipped = report.skipped,
            "structure enhancement completed"
        );
        Ok(())
    }

    /// Run every page and build the output document without saving it.
    pub async fn assemble(
        &self,
        source: &SourcePdf,
        report: &mut EnhancementReport,
    ) -> Result<OutputAssembler> {
        let page_ids = source.page_ids();
        info!(
            pages = page_ids.len(),
            service = self.service.name(),
            "starting structure enhancement"
        );

        let mut assembler = OutputAssembler::for_source(source);
        for (index, page_id) in page_ids.iter().copied().enumerate() {
            let page_number = index as u32 + 1;
            let result = self.enhance_page(source, index, page_number).await;
            let page_report = self.place_page(&mut assembler, source, page_id, result)?;
            report.record(page_report);
        }
        Ok(assembler)
    }

    /// Append the rebuilt page, or the original when there is none or the
    /// rebuilt one cannot be copied in.
    fn place_page(
        &self,
        assembler: &mut OutputAssembler,
        source: &SourcePdf,
        page_id: ObjectId,
        result: PageResult,
    ) -> Result<PageReport> {
        let PageResult { mut report, rebuilt } = result;

        if let Some(rebuilt) = rebuilt {
            match assembler.append_rebuilt(&rebuilt) {
                Ok(()) => return Ok(report),
                Err(err) => {
                    warn!(
                        page = report.page_number,
                        stage = %PageStage::Reconstructing,
                        error_kind = err.kind(),
                        error = %err,
                        "rebuilt page rejected, keeping original page"
                    );
                    report.outcome = PageOutcome::FallbackReconstructionFailed;
                    report.final_stage = PageStage::Fallback;
                    report.error = Some(err.to_string());
                }
            }
        }

        assembler.append_original(source, page_id).map_err(|err| {
            PagewerkError::DocumentSaveError(format!(
                "cannot copy original page {} into output: {}",
                report.page_number, err
            ))
        })?;
        Ok(report)
    }

    // -- Page -----------------------------------------------------------------

    /// Run one page through the state machine. Never fails: every error
    /// becomes a fallback outcome in the report.
    #[instrument(skip(self, source))]
    pub async fn enhance_page(
        &self,
        source: &SourcePdf,
        page_index: usize,
        page_number: u32,
    ) -> PageResult {
        let started = Instant::now();
        let mut stage = PageStage::Pending;
        let mut attempts = 0u32;

        let result = self
            .run_page(source, page_index, page_number, &mut stage, &mut attempts)
            .await;

        let (outcome, rebuilt, error) = match result {
            Ok(PageStep::Rebuilt(rebuilt)) => {
                advance(&mut stage, PageStage::Done, page_number);
                (PageOutcome::Enhanced, Some(rebuilt), None)
            }
            Ok(PageStep::Skipped(outcome)) => {
                debug!(
                    page = page_number,
                    stage = %stage,
                    outcome = ?outcome,
                    "nothing to enhance, keeping original page"
                );
                advance(&mut stage, PageStage::Fallback, page_number);
                (outcome, None, None)
            }
            Err(PageFailure { outcome, error }) => {
                warn!(
                    page = page_number,
                    stage = %stage,
                    outcome = ?outcome,
                    error_kind = error.kind(),
                    error = %error,
                    "page enhancement failed, keeping original page"
                );
                advance(&mut stage, PageStage::Fallback, page_number);
                (outcome, None, Some(error.to_string()))
            }
        };

        PageResult {
            report: PageReport {
                page_number,
                outcome,
                final_stage: stage,
                attempts,
                elapsed: started.elapsed(),
                error,
            },
            rebuilt,
        }
    }

    async fn run_page(
        &self,
        source: &SourcePdf,
        page_index: usize,
        page_number: u32,
        stage: &mut PageStage,
        attempts: &mut u32,
    ) -> std::result::Result<PageStep, PageFailure> {
        advance(stage, PageStage::Encoding, page_number);
        let encode = self.codec.encode(source.path(), page_index);
        let mut document = match tokio::time::timeout(self.encode_timeout, encode).await {
            Ok(Ok(document)) => document,
            Ok(Err(err)) => {
                return Err(PageFailure::new(PageOutcome::FallbackConversionFailed, err));
            }
            Err(_) => {
                return Err(PageFailure::new(
                    PageOutcome::FallbackConversionFailed,
                    PagewerkError::ConversionTimeout(self.encode_timeout.as_secs()),
                ));
            }
        };

        advance(stage, PageStage::Extracted, page_number);
        let text = TextStreamExtractor::extract(&document);
        if text.trim().is_empty() {
            return Ok(PageStep::Skipped(PageOutcome::SkippedNoText));
        }
        let chars = text.chars().count();
        if chars > self.max_page_text_chars {
            return Err(PageFailure::new(
                PageOutcome::FallbackExtractionFailed,
                PagewerkError::ExtractionError(format!(
                    "{} characters of stream text exceed the {} character limit",
                    chars, self.max_page_text_chars
                )),
            ));
        }

        advance(stage, PageStage::Correcting, page_number);
        let service = self.service.as_ref();
        let text = text.as_str();
        let outcome =
            retry_with_timeout(&self.retry, move |_| service.enhance_pdf_structure(text)).await;
        *attempts = outcome.attempts;
        let diff = outcome
            .result
            .map_err(|err| PageFailure::new(PageOutcome::FallbackServiceFailed, err))?;

        advance(stage, PageStage::DiffReceived, page_number);
        if diff.trim().is_empty() {
            return Ok(PageStep::Skipped(PageOutcome::SkippedEmptyDiff));
        }

        advance(stage, PageStage::Merging, page_number);
        let summary = DiffMerger::try_merge(&mut document, &diff)
            .map_err(|err| PageFailure::new(PageOutcome::FallbackMergeFailed, err))?;
        if summary.target.is_none() {
            return Ok(PageStep::Skipped(PageOutcome::SkippedEmptyDiff));
        }

        advance(stage, PageStage::Reconstructing, page_number);
        let rebuilt = self
            .rebuild(&document, page_number)
            .await
            .map_err(|err| PageFailure::new(PageOutcome::FallbackReconstructionFailed, err))?;

        debug!(
            page = page_number,
            changes = summary.changes,
            merged_len = summary.merged_len,
            "page rebuilt"
        );
        Ok(PageStep::Rebuilt(rebuilt))
    }

    /// Decode the merged structure to a scratch file and load it back. The
    /// scratch directory is removed when this returns.
    async fn rebuild(&self, document: &StructuralDocument, page_number: u32) -> Result<Document> {
        let scratch = tempfile::Builder::new()
            .prefix("pagewerk-page-")
            .tempdir()
            .map_err(|err| {
                let reason = format!("cannot create scratch directory: {err}");
                PagewerkError::ReconstructionError(reason)
            })?;
        let page_path = scratch.path().join(format!("page-{page_number}.pdf"));

        tokio::time::timeout(self.decode_timeout, self.codec.decode_to_file(document, &page_path))
            .await
            .map_err(|_| {
                PagewerkError::ReconstructionError(format!(
                    "decode timed out after {}s",
                    self.decode_timeout.as_secs()
                ))
            })??;

        let rebuilt = Document::load(&page_path).map_err(|err| {
            PagewerkError::ReconstructionError(format!(
                "cannot load rebuilt page {}: {}",
                page_path.display(),
                err
            ))
        })?;
        if rebuilt.get_pages().is_empty() {
            return Err(PagewerkError::ReconstructionError("rebuilt PDF has no pages".into()));
        }
        Ok(rebuilt)
    }
}

fn advance(stage: &mut PageStage, next: PageStage, page_number: u32) {
    debug!(page = page_number, from = %stage, to = %next, "page stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use crate::testing::{
        FakeCodec, Script, ScriptedService, page_contents, text_content, write_text_pdf,
    };

    struct Fixture {
        _dir: tempfile::TempDir,
        source: SourcePdf,
        output: std::path::PathBuf,
    }

    fn fixture(texts: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("input.pdf");
        write_text_pdf(&input, texts);
        let source = SourcePdf::open(&input).expect("open fixture");
        let output = dir.path().join("output.pdf");
        Fixture {
            _dir: dir,
            source,
            output,
        }
    }

    fn orchestrator(codec: FakeCodec, service: ScriptedService) -> PageEnhancementOrchestrator {
        let config = EnhanceConfig::default();
        PageEnhancementOrchestrator::new(&config, Box::new(codec), Box::new(service))
    }

    fn written_contents(path: &Path) -> Vec<String> {
        page_contents(&Document::load(path).expect("reload output"))
    }

    fn content(text: &str) -> String {
        String::from_utf8(text_content(text)).expect("utf8")
    }

    #[tokio::test]
    async fn three_page_typo_fix_end_to_end() {
        let fx = fixture(&["This page has an eror", "", "Another eror here"]);
        let orch = orchestrator(FakeCodec::default(), ScriptedService::new(Script::FixTypos));

        let report = orch.enhance_document(&fx.source, &fx.output).await.expect("enhance");

        assert_eq!(
            report.outcomes(),
            vec![PageOutcome::Enhanced, PageOutcome::SkippedNoText, PageOutcome::Enhanced]
        );
        assert_eq!((report.total, report.enhanced, report.failed, report.skipped), (3, 2, 0, 1));

        let pages = written_contents(&fx.output);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], content("This page has an error"));
        assert_eq!(pages[1], "");
        assert_eq!(pages[2], content("Another error here"));
    }

    #[tokio::test]
    async fn page_without_text_never_calls_service() {
        let fx = fixture(&[""]);
        let service = ScriptedService::new(Script::FixTypos);
        let calls = service.counter();
        let orch = orchestrator(FakeCodec::default(), service);

        let result = orch.enhance_page(&fx.source, 0, 1).await;

        assert_eq!(result.report.outcome, PageOutcome::SkippedNoText);
        assert_eq!(result.report.attempts, 0);
        assert!(result.rebuilt.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_service_is_retried_then_falls_back() {
        let fx = fixture(&["Has an eror"]);
        let service = ScriptedService::new(Script::Fail);
        let calls = service.counter();
        let orch = orchestrator(FakeCodec::default(), service);

        let result = orch.enhance_page(&fx.source, 0, 1).await;

        assert_eq!(result.report.outcome, PageOutcome::FallbackServiceFailed);
        assert_eq!(result.report.attempts, 3);
        assert_eq!(result.report.final_stage, PageStage::Fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn any_service_error_is_retried() {
        let fx = fixture(&["Has an eror"]);
        let service = ScriptedService::new(Script::MissingClient);
        let calls = service.counter();
        let orch = orchestrator(FakeCodec::default(), service);

        let result = orch.enhance_page(&fx.source, 0, 1).await;

        assert_eq!(result.report.outcome, PageOutcome::FallbackServiceFailed);
        assert_eq!(result.report.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_service_times_out_on_every_attempt() {
        let fx = fixture(&["Has an eror"]);
        let orch = orchestrator(FakeCodec::default(), ScriptedService::new(Script::Hang));

        let result = orch.enhance_page(&fx.source, 0, 1).await;

        assert_eq!(result.report.outcome, PageOutcome::FallbackServiceFailed);
        assert_eq!(result.report.attempts, 3);
        assert!(result.report.error.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_encode_falls_back_without_retry() {
        let fx = fixture(&["Has an eror"]);
        let codec = FakeCodec {
            hang_encode: true,
            ..Default::default()
        };
        let encodes = codec.encode_calls.clone();
        let service = ScriptedService::new(Script::FixTypos);
        let calls = service.counter();
        let orch = orchestrator(codec, service);

        let result = orch.enhance_page(&fx.source, 0, 1).await;

        assert_eq!(result.report.outcome, PageOutcome::FallbackConversionFailed);
        assert_eq!(encodes.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_page_does_not_affect_neighbours() {
        let fx = fixture(&["first eror", "second eror", "third eror"]);
        let codec = FakeCodec {
            fail_encode_for: vec![1],
            ..Default::default()
        };
        let orch = orchestrator(codec, ScriptedService::new(Script::FixTypos));

        let report = orch.enhance_document(&fx.source, &fx.output).await.expect("enhance");

        assert_eq!(
            report.outcomes(),
            vec![
                PageOutcome::Enhanced,
                PageOutcome::FallbackConversionFailed,
                PageOutcome::Enhanced
            ]
        );
        let pages = written_contents(&fx.output);
        assert_eq!(pages[0], content("first error"));
        assert_eq!(pages[1], content("second eror"));
        assert_eq!(pages[2], content("third error"));
    }

    #[tokio::test]
    async fn empty_diff_keeps_original_page() {
        let fx = fixture(&["nothing wrong here"]);
        let orch = orchestrator(FakeCodec::default(), ScriptedService::new(Script::FixTypos));

        let report = orch.enhance_document(&fx.source, &fx.output).await.expect("enhance");

        assert_eq!(report.outcomes(), vec![PageOutcome::SkippedEmptyDiff]);
        assert_eq!(report.pages[0].attempts, 1);
        assert_eq!(written_contents(&fx.output), vec![content("nothing wrong here")]);
    }

    #[tokio::test]
    async fn prose_reply_is_merge_failure() {
        let fx = fixture(&["Has an eror"]);
        let reply = Script::Reply("Sure! Here is the corrected text.".into());
        let orch = orchestrator(FakeCodec::default(), ScriptedService::new(reply));

        let result = orch.enhance_page(&fx.source, 0, 1).await;
        assert_eq!(result.report.outcome, PageOutcome::FallbackMergeFailed);
    }

    #[tokio::test]
    async fn decode_failure_is_reconstruction_fallback() {
        let fx = fixture(&["Has an eror"]);
        let codec = FakeCodec {
            fail_decode: true,
            ..Default::default()
        };
        let orch = orchestrator(codec, ScriptedService::new(Script::FixTypos));

        let report = orch.enhance_document(&fx.source, &fx.output).await.expect("enhance");

        assert_eq!(report.outcomes(), vec![PageOutcome::FallbackReconstructionFailed]);
        assert_eq!(written_contents(&fx.output), vec![content("Has an eror")]);
    }

    #[tokio::test]
    async fn oversized_text_is_extraction_failure() {
        let fx = fixture(&["Has an eror"]);
        let config = EnhanceConfig {
            max_page_text_chars: 8,
            ..Default::default()
        };
        let service = ScriptedService::new(Script::FixTypos);
        let calls = service.counter();
        let codec = Box::new(FakeCodec::default());
        let orch = PageEnhancementOrchestrator::new(&config, codec, Box::new(service));

        let result = orch.enhance_page(&fx.source, 0, 1).await;

        assert_eq!(result.report.outcome, PageOutcome::FallbackExtractionFailed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unwritable_output_is_save_error() {
        let fx = fixture(&["Has an eror"]);
        let orch = orchestrator(FakeCodec::default(), ScriptedService::new(Script::FixTypos));

        let missing = fx.output.with_file_name("missing").join("out.pdf");
        let err = orch.enhance_document(&fx.source, &missing).await.unwrap_err();
        assert!(matches!(err, PagewerkError::DocumentSaveError(_)));
    }

    #[tokio::test]
    async fn report_pages_are_in_order() {
        let fx = fixture(&["a eror", "b", "c eror", "d"]);
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let codec = FakeCodec {
            encode_calls: counter.clone(),
            ..Default::default()
        };
        let orch = orchestrator(codec, ScriptedService::new(Script::FixTypos));

        let report = orch.enhance_document(&fx.source, &fx.output).await.expect("enhance");

        let numbers: Vec<u32> = report.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert!(report.finished_at >= report.started_at);
    }
}
