// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Re-embedding corrected text into a structural document.
//
// The whole merged text goes into the first stream object and every other
// stream is emptied. Text is not redistributed across the original streams.

use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, warn};

use crate::diff::UnifiedDiff;
use crate::document::StructuralDocument;
use crate::extract::TextStreamExtractor;

/// What a successful merge changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    /// Object that received the merged text; `None` when the diff held no
    /// edit lines and the document was left alone.
    pub target: Option<String>,
    /// Other stream objects whose data was cleared.
    pub cleared: usize,
    /// Additions plus deletions in the applied diff.
    pub changes: usize,
    pub merged_len: usize,
}

/// Applies correction diffs to structural documents.
pub struct DiffMerger;

impl DiffMerger {
    /// Apply `diff_text` to the document's extracted text and write the result
    /// back. The document is only modified when every step succeeds.
    pub fn try_merge(document: &mut StructuralDocument, diff_text: &str) -> Result<MergeSummary> {
        let diff = UnifiedDiff::parse(diff_text)?;
        let original = TextStreamExtractor::extract(document);
        if diff.is_empty() {
            return Ok(MergeSummary {
                target: None,
                cleared: 0,
                changes: 0,
                merged_len: original.len(),
            });
        }
        let merged = diff.apply(&original);

        let mut updated = document.clone();
        let (target, cleared) = write_merged_text(&mut updated, &merged)?;
        *document = updated;

        debug!(
            object = %target,
            cleared,
            changes = diff.change_count(),
            "diff merged into structure"
        );
        Ok(MergeSummary {
            target: Some(target),
            cleared,
            changes: diff.change_count(),
            merged_len: merged.len(),
        })
    }

    /// Infallible variant: any internal error leaves the document exactly as
    /// it was.
    pub fn merge(mut document: StructuralDocument, diff_text: &str) -> StructuralDocument {
        if diff_text.trim().is_empty() {
            return document;
        }
        if let Err(err) = Self::try_merge(&mut document, diff_text) {
            warn!(error = %err, "diff merge failed, keeping original structure");
        }
        document
    }
}

/// Write `merged_text` into the first stream object and clear the rest.
///
/// Fails with `MergeError` when the document has no stream object.
pub fn update_document(document: &mut StructuralDocument, merged_text: &str) -> Result<()> {
    write_merged_text(document, merged_text).map(|_| ())
}

fn write_merged_text(
    document: &mut StructuralDocument,
    merged_text: &str,
) -> Result<(String, usize)> {
    let mut target = None;
    let mut cleared = 0usize;

    for (key, data) in document.streams_mut() {
        if target.is_none() {
            *data = merged_text.to_string();
            target = Some(key.clone());
        } else {
            data.clear();
            cleared += 1;
        }
    }

    let target = target.ok_or_else(|| {
        PagewerkError::MergeError("structural document has no stream object to receive text".into())
    })?;
    Ok((target, cleared))
}
