// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified diff parsing and positional application.
//
// The merge is positional, not content-matching: context and deletion lines
// are assumed to follow the original text's line order. A diff that does not
// line up produces a best-effort result rather than an error.

use pagewerk_core::error::{PagewerkError, Result};

/// One interpreted line of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// Keep the current original line.
    Context(String),
    /// Drop the current original line.
    Deletion(String),
    /// Insert this payload.
    Addition(String),
}

/// An ordered edit script with header and noise lines removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnifiedDiff {
    lines: Vec<DiffLine>,
}

impl UnifiedDiff {
    /// Parse diff text.
    ///
    /// Hunk and file headers (`@@`, `---`, `+++`), Markdown code fences and
    /// `\ No newline at end of file` markers are discarded. A blank line is a
    /// context line with an empty payload. Anything else without a diff
    /// prefix is rejected with `MergeError`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Vec::new();

        for (number, raw) in text.lines().enumerate() {
            if is_noise(raw) {
                continue;
            }
            let line = match raw.chars().next() {
                None => DiffLine::Context(String::new()),
                Some(' ') => DiffLine::Context(raw[1..].to_string()),
                Some('-') => DiffLine::Deletion(raw[1..].to_string()),
                Some('+') => DiffLine::Addition(raw[1..].to_string()),
                Some(_) => {
                    return Err(PagewerkError::MergeError(format!(
                        "line {} is not a unified diff line: {:?}",
                        number + 1,
                        truncate(raw, 40)
                    )));
                }
            };
            lines.push(line);
        }

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of additions and deletions (context excluded).
    pub fn change_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| !matches!(line, DiffLine::Context(_)))
            .count()
    }

    /// Walk `original` with a line cursor and replay the edit script.
    pub fn apply(&self, original: &str) -> String {
        let source: Vec<&str> = original.split('\n').collect();
        let mut output: Vec<&str> = Vec::with_capacity(source.len() + self.lines.len());
        let mut cursor = 0usize;

        for line in &self.lines {
            match line {
                DiffLine::Context(payload) => {
                    // Past the end of the original, fall back to the diff's own copy.
                    output.push(source.get(cursor).copied().unwrap_or(payload.as_str()));
                    cursor += 1;
                }
                DiffLine::Deletion(_) => cursor += 1,
                DiffLine::Addition(payload) => output.push(payload.as_str()),
            }
        }

        if cursor < source.len() {
            output.extend_from_slice(&source[cursor..]);
        }

        output.join("\n")
    }
}

/// Apply diff text to `original_text`.
///
/// Whitespace-only diff text, or diff text reduced to nothing after header
/// stripping, returns `original_text` unchanged.
pub fn apply_diff(original_text: &str, diff_text: &str) -> Result<String> {
    if diff_text.trim().is_empty() {
        return Ok(original_text.to_string());
    }
    let diff = UnifiedDiff::parse(diff_text)?;
    if diff.is_empty() {
        return Ok(original_text.to_string());
    }
    Ok(diff.apply(original_text))
}

fn is_noise(line: &str) -> bool {
    line.starts_with("@@")
        || line.starts_with("---")
        || line.starts_with("+++")
        || line.starts_with("```")
        || line.starts_with("\\ No newline")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
