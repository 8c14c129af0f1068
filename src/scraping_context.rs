use std::sync::Arc;

use crate::{
    config::ScrapingConfig,
    diagnostics::{DiagnosticSink, NoopSink},
};

/// What a case fetch needs besides the query itself. Cheap to clone and
/// shared by every request the API serves; holds no per-fetch state.
#[derive(Clone)]
pub struct ScrapingContext {
    pub scraping_config: ScrapingConfig,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl ScrapingContext {
    pub fn new(scraping_config: ScrapingConfig) -> Self {
        Self {
            scraping_config,
            diagnostics: Arc::new(NoopSink),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

impl Default for ScrapingContext {
    fn default() -> Self {
        Self::new(ScrapingConfig::default())
    }
}
