// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gemini command-line client provider.

use std::path::PathBuf;

use async_trait::async_trait;
use pagewerk_core::error::Result;
use tracing::{debug, instrument};

use crate::cli::{probe_version, run_cli};
use crate::prompt::structure_enhancement_prompt;
use crate::service::CorrectionService;

/// Runs `gemini -y -p <prompt>` non-interactively.
pub struct GeminiCliService {
    program: PathBuf,
}

impl GeminiCliService {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CorrectionService for GeminiCliService {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip_all, fields(provider = "gemini", text_len = text.len()))]
    async fn enhance_pdf_structure(&self, text: &str) -> Result<String> {
        let prompt = structure_enhancement_prompt(text);
        let diff = run_cli(&self.program, ["-y", "-p", prompt.as_str()]).await?;
        debug!(diff_len = diff.len(), "structure enhancement answered");
        Ok(diff)
    }

    async fn is_available(&self) -> bool {
        probe_version(&self.program).await
    }
}
