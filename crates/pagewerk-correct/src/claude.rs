// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Claude command-line client provider.

use std::path::PathBuf;

use async_trait::async_trait;
use pagewerk_core::error::Result;
use tracing::{debug, instrument};

use crate::cli::{probe_version, run_cli};
use crate::prompt::structure_enhancement_prompt;
use crate::service::CorrectionService;

/// Runs `claude -p <prompt>` non-interactively.
pub struct ClaudeCliService {
    program: PathBuf,
    model: String,
}

impl ClaudeCliService {
    pub fn new(program: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    fn args(&self, prompt: String) -> Vec<String> {
        vec![
            "--model".into(),
            self.model.clone(),
            "--dangerously-skip-permissions".into(),
            "-p".into(),
            prompt,
        ]
    }
}

#[async_trait]
impl CorrectionService for ClaudeCliService {
    fn name(&self) -> &str {
        "claude"
    }

    #[instrument(skip_all, fields(provider = "claude", text_len = text.len()))]
    async fn enhance_pdf_structure(&self, text: &str) -> Result<String> {
        let diff = run_cli(&self.program, self.args(structure_enhancement_prompt(text))).await?;
        debug!(diff_len = diff.len(), "structure enhancement answered");
        Ok(diff)
    }

    async fn is_available(&self) -> bool {
        probe_version(&self.program).await
    }
}
