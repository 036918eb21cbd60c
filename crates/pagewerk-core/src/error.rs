// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewerk.

use thiserror::Error;

/// Top-level error type for all Pagewerk operations.
///
/// Everything above `DocumentOpenError` is recoverable at page granularity:
/// the orchestrator turns it into a fallback outcome for that page only.
#[derive(Debug, Error)]
pub enum PagewerkError {
    // -- Structural codec --
    #[error("structural conversion timed out after {0}s")]
    ConversionTimeout(u64),

    #[error("structural conversion failed: {0}")]
    ConversionError(String),

    #[error("page reconstruction failed: {0}")]
    ReconstructionError(String),

    // -- Text handling --
    #[error("text extraction failed: {0}")]
    ExtractionError(String),

    #[error("diff merge failed: {0}")]
    MergeError(String),

    // -- Correction service --
    #[error("correction service timed out after {0}s")]
    ServiceTimeout(u64),

    #[error("correction service failed: {0}")]
    ServiceError(String),

    // -- Whole document --
    #[error("cannot open input PDF: {0}")]
    DocumentOpenError(String),

    #[error("cannot write output PDF: {0}")]
    DocumentSaveError(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Environment --
    #[error("required tool '{0}' not found in PATH")]
    ToolNotFound(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PagewerkError {
    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConversionTimeout(_) => "conversion_timeout",
            Self::ConversionError(_) => "conversion_error",
            Self::ReconstructionError(_) => "reconstruction_error",
            Self::ExtractionError(_) => "extraction_error",
            Self::MergeError(_) => "merge_error",
            Self::ServiceTimeout(_) => "service_timeout",
            Self::ServiceError(_) => "service_error",
            Self::DocumentOpenError(_) => "document_open_error",
            Self::DocumentSaveError(_) => "document_save_error",
            Self::IntegrityMismatch { .. } => "integrity_mismatch",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewerkError>;
