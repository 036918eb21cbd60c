// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement configuration.
//
// Tool paths are resolved once per run and handed to each component by
// reference.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PagewerkError, Result};

/// Locations of the external binaries the pipeline shells out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    /// Structural-rewrite tool (qpdf).
    pub qpdf: PathBuf,
    /// Claude command-line client.
    pub claude: PathBuf,
    /// Gemini command-line client.
    pub gemini: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            qpdf: PathBuf::from("qpdf"),
            claude: PathBuf::from("claude"),
            gemini: PathBuf::from("gemini"),
        }
    }
}

impl ToolPaths {
    /// Resolve every configured tool against `PATH`. Explicit paths are
    /// checked in place, bare names are searched for.
    ///
    /// qpdf is mandatory and yields `ToolNotFound` when missing. The AI
    /// clients are optional; unresolved ones keep their configured name and
    /// are later reported unavailable by the service factory.
    pub fn resolve(&self) -> Result<Self> {
        self.resolve_in(std::env::var_os("PATH").unwrap_or_default())
    }

    /// Like [`ToolPaths::resolve`], searching `search_path` instead of `PATH`.
    pub fn resolve_in(&self, search_path: impl AsRef<OsStr>) -> Result<Self> {
        let search_path = search_path.as_ref();
        let lookup = |tool: &Path| which::which_in(tool, Some(search_path), ".");

        let qpdf = lookup(&self.qpdf).map_err(|err| {
            PagewerkError::ToolNotFound(format!("{}: {}", self.qpdf.display(), err))
        })?;
        Ok(Self {
            qpdf,
            claude: lookup(&self.claude).unwrap_or_else(|_| self.claude.clone()),
            gemini: lookup(&self.gemini).unwrap_or_else(|_| self.gemini.clone()),
        })
    }
}

/// Which AI correction provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Claude,
    Gemini,
}

impl AiProvider {
    /// All providers the factory knows how to build.
    pub const ALL: [AiProvider; 2] = [AiProvider::Claude, AiProvider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }
}

/// AI integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Master switch for every AI feature.
    pub enabled: bool,
    /// Selected provider.
    pub provider: AiProvider,
    /// Enable page-by-page structural enhancement.
    pub structure_enhancement_enabled: bool,
    /// Model identifier passed to providers that accept one.
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: AiProvider::Claude,
            structure_enhancement_enabled: false,
            model: "claude-sonnet-4-20250514".into(),
        }
    }
}

/// Settings for the per-page enhancement pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceConfig {
    pub tools: ToolPaths,
    pub ai: AiConfig,
    /// Upper bound on a single structural encode (one attempt, no retry).
    pub encode_timeout_secs: u64,
    /// Upper bound on a single structural decode.
    pub decode_timeout_secs: u64,
    /// Upper bound on a single correction-service call.
    pub correction_timeout_secs: u64,
    /// Additional correction attempts after the first one fails.
    pub max_service_retries: u32,
    /// Pause between correction attempts.
    pub retry_delay_ms: u64,
    /// Pages whose extracted text exceeds this many characters are not sent
    /// to the correction service.
    pub max_page_text_chars: usize,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            ai: AiConfig::default(),
            encode_timeout_secs: 30,
            decode_timeout_secs: 30,
            correction_timeout_secs: 60,
            max_service_retries: 2,
            retry_delay_ms: 1000,
            max_page_text_chars: 64_000,
        }
    }
}

impl EnhanceConfig {
    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }

    pub fn decode_timeout(&self) -> Duration {
        Duration::from_secs(self.decode_timeout_secs)
    }

    pub fn correction_timeout(&self) -> Duration {
        Duration::from_secs(self.correction_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
