// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Prompt text for structural enhancement requests.

/// Build the request asking a provider to answer with a unified diff only.
pub fn structure_enhancement_prompt(text: &str) -> String {
    format!(
        r#"Instructions:
You are an expert document editor. The text below was extracted from a PDF via OCR and may contain both textual errors and structural problems.

Task requirements:
- Step 1: Correct spelling, grammar, and misplaced, repeated, or missing words
- Step 2: Improve structure: headings, paragraph breaks, lists, and tables, based on context
- Step 3: Do NOT insert new content or change meaning
- Step 4: Return ALL changes as a single unified diff: removed lines prefixed with "-", added lines with "+", unchanged lines with a single space

Example:
--- original
+++ corrected
@@ -1,3 +1,3 @@
 This line stays the same
-This line has an eror
+This line has an error
 Another unchanged line

If nothing needs to change, output nothing.

Text to correct and format:
"""
{text}
"""

Output only the unified diff, nothing else."#
    )
}
