// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Top-level entry point: a usable output file always exists unless the input
// cannot be opened or the output location cannot be written at all.

use std::path::Path;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::{EnhanceConfig, EnhancementReport};
use pagewerk_correct::CorrectionServiceFactory;
use pagewerk_structure::QpdfCodec;
use tracing::{error, info, instrument, warn};

use crate::integrity::verify_hash;
use crate::orchestrator::PageEnhancementOrchestrator;
use crate::pdf::SourcePdf;

/// Enhance `input` into `output` using the tools and provider in `config`.
///
/// Tool paths are resolved first. Without qpdf or an available correction
/// service the input is copied unchanged.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub async fn enhance_file(
    config: &EnhanceConfig,
    input: &Path,
    output: &Path,
) -> Result<EnhancementReport> {
    let source = SourcePdf::open(input)
        .inspect_err(|err| error!(error = %err, "cannot open input PDF"))?;

    let tools = match config.tools.resolve() {
        Ok(tools) => tools,
        Err(err) => {
            warn!(error = %err, "structural tool unavailable, copying input without enhancement");
            return copy_verbatim(&source, output).await;
        }
    };
    let config = EnhanceConfig {
        tools,
        ..config.clone()
    };

    let Some(service) = CorrectionServiceFactory::create(&config.ai, &config.tools).await else {
        warn!("no correction service available, copying input without enhancement");
        return copy_verbatim(&source, output).await;
    };

    let codec = Box::new(QpdfCodec::from_config(&config));
    let orchestrator = PageEnhancementOrchestrator::new(&config, codec, service);
    enhance_with_fallback(&orchestrator, &source, output).await
}

/// Run `orchestrator` over `source`, falling back to a verbatim copy of the
/// input when the output document cannot be assembled or saved. The copy's
/// report keeps the page reports of the run that preceded it.
pub async fn enhance_with_fallback(
    orchestrator: &PageEnhancementOrchestrator,
    source: &SourcePdf,
    output: &Path,
) -> Result<EnhancementReport> {
    let mut report = EnhancementReport::new(output.to_path_buf());
    match orchestrator.enhance_into(source, output, &mut report).await {
        Ok(()) => Ok(report),
        Err(PagewerkError::DocumentSaveError(reason)) => {
            warn!(%reason, "assembled output not written, copying input instead");
            copy_into_report(source, output, report).await.map_err(|copy_err| {
                error!(error = %copy_err, "verbatim copy failed too");
                PagewerkError::DocumentSaveError(format!(
                    "{reason}; verbatim copy also failed: {copy_err}"
                ))
            })
        }
        Err(err) => Err(err),
    }
}

/// Copy the input file to `output`, creating the destination directory, and
/// check the copy against the digest taken when the input was opened.
pub async fn copy_verbatim(source: &SourcePdf, output: &Path) -> Result<EnhancementReport> {
    copy_into_report(source, output, EnhancementReport::new(output.to_path_buf())).await
}

async fn copy_into_report(
    source: &SourcePdf,
    output: &Path,
    mut report: EnhancementReport,
) -> Result<EnhancementReport> {
    if same_file(source.path(), output).await {
        return Err(PagewerkError::DocumentSaveError(format!(
            "output {} is the input file",
            output.display()
        )));
    }

    let copy = async {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source.path(), output).await?;
        tokio::fs::read(output).await
    };
    let written = copy.await.map_err(|err| {
        PagewerkError::DocumentSaveError(format!(
            "cannot copy {} to {}: {}",
            source.path().display(),
            output.display(),
            err
        ))
    })?;
    verify_hash(&written, source.sha256()).map_err(|err| {
        PagewerkError::DocumentSaveError(format!(
            "copy of {} differs from input: {}",
            source.path().display(),
            err
        ))
    })?;
    let bytes = written.len();

    report.input_sha256 = Some(source.sha256().to_owned());
    report.total = source.page_count();
    report.copied_verbatim = true;
    report.finish();

    info!(bytes, pages = report.total, "input copied verbatim");
    Ok(report)
}

/// Whether both paths name one existing file.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
