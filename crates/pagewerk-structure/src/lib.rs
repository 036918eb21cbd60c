// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-structure: Structural page handling for the Pagewerk pipeline.
//
// Provides the structural document model, the qpdf-backed page codec,
// text-stream extraction, and unified-diff merging.

pub mod codec;
pub mod diff;
pub mod document;
pub mod extract;
pub mod merge;

pub use codec::{QpdfCodec, StructuralCodec};
pub use diff::{DiffLine, UnifiedDiff, apply_diff};
pub use document::{ObjectKey, StreamObject, StructuralDocument, StructuralObject};
pub use extract::TextStreamExtractor;
pub use merge::{DiffMerger, MergeSummary, update_document};
