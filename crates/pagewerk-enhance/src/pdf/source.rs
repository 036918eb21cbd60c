// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The input document of an enhancement run, opened once with `lopdf` and kept
// for both page enumeration and original-page fallbacks.

use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, info, instrument};

use crate::integrity::hash_bytes;

/// An opened input PDF.
pub struct SourcePdf {
    document: Document,
    path: PathBuf,
    sha256: String,
}

impl SourcePdf {
    /// Open a PDF from the filesystem.
    ///
    /// Failure here is the one fatal error of a run: nothing can be produced
    /// without the page list.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("opening source PDF");

        let bytes = std::fs::read(path).map_err(|err| {
            PagewerkError::DocumentOpenError(format!("failed to read {}: {}", path.display(), err))
        })?;
        let document = Document::load_mem(&bytes).map_err(|err| {
            PagewerkError::DocumentOpenError(format!("failed to open {}: {}", path.display(), err))
        })?;
        let sha256 = hash_bytes(&bytes);

        debug!(
            pages = document.get_pages().len(),
            version = %document.version,
            bytes = bytes.len(),
            %sha256,
            "source PDF loaded"
        );

        Ok(Self {
            document,
            path: path.to_path_buf(),
            sha256,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 of the file as read, lowercase hex.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // `get_pages` is keyed by 1-based page number, so values iterate in order.
        self.document.get_pages().into_values().collect()
    }
}
