// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-correct: AI correction providers for the Pagewerk pipeline.
//
// Every provider implements `CorrectionService`; the factory picks one from
// configuration and hands back `None` rather than a service that cannot run.

pub mod claude;
pub mod cli;
pub mod factory;
pub mod gemini;
pub mod prompt;
pub mod service;

pub use claude::ClaudeCliService;
pub use factory::CorrectionServiceFactory;
pub use gemini::GeminiCliService;
pub use service::CorrectionService;
