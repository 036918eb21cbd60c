// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-stream extraction.
//
// Every stream payload is treated as text, whatever it actually encodes
// (content streams, font programs, inline image data). Callers needing only
// text-showing operators must filter further.

use crate::document::StructuralDocument;

/// Joins stream payloads for submission to the correction service.
pub struct TextStreamExtractor;

impl TextStreamExtractor {
    /// Concatenate the `data` of every stream object exposing one, in
    /// iteration order, separated by `\n`. Returns an empty string when the
    /// page has no such stream, which callers treat as "nothing to enhance".
    pub fn extract(document: &StructuralDocument) -> String {
        let parts: Vec<&str> = document.streams().map(|(_, data)| data).collect();
        parts.join("\n")
    }
}
