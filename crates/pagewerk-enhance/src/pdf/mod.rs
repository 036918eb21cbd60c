// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: opening the input and assembling the output with `lopdf`.

pub mod assembler;
pub mod clone;
pub mod source;

pub use assembler::OutputAssembler;
pub use source::SourcePdf;
