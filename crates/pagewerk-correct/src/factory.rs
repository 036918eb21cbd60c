// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provider selection.

use pagewerk_core::config::{AiConfig, AiProvider, ToolPaths};
use tracing::{info, warn};

use crate::claude::ClaudeCliService;
use crate::gemini::GeminiCliService;
use crate::service::CorrectionService;

/// Builds correction services from configuration.
pub struct CorrectionServiceFactory;

impl CorrectionServiceFactory {
    /// Build the configured provider, or `None` when AI structure enhancement
    /// is switched off or the provider fails its availability probe.
    pub async fn create(ai: &AiConfig, tools: &ToolPaths) -> Option<Box<dyn CorrectionService>> {
        if !ai.enabled || !ai.structure_enhancement_enabled {
            info!("AI structure enhancement disabled");
            return None;
        }

        let service = Self::build(ai.provider, ai, tools);
        if !service.is_available().await {
            warn!(provider = ai.provider.as_str(), "AI service not available");
            return None;
        }

        info!(provider = ai.provider.as_str(), "AI service ready");
        Some(service)
    }

    /// Availability of every known provider, in declaration order.
    pub async fn list_available(ai: &AiConfig, tools: &ToolPaths) -> Vec<(AiProvider, bool)> {
        let mut available = Vec::with_capacity(AiProvider::ALL.len());
        for provider in AiProvider::ALL {
            let service = Self::build(provider, ai, tools);
            available.push((provider, service.is_available().await));
        }
        available
    }

    fn build(provider: AiProvider, ai: &AiConfig, tools: &ToolPaths) -> Box<dyn CorrectionService> {
        match provider {
            AiProvider::Claude => Box::new(ClaudeCliService::new(&tools.claude, ai.model.clone())),
            AiProvider::Gemini => Box::new(GeminiCliService::new(&tools.gemini)),
        }
    }
}
