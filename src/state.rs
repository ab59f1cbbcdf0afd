use std::sync::Arc;

use crate::budget::clock::{Clock, SystemClock};
use crate::budget::numbering::BudgetNumberGenerator;
use crate::budget::service::BudgetPdfService;
use crate::budget::template::{BudgetTemplate, TemplateAssets};
use crate::config::AppConfig;
use crate::pdf::{ChromePdfEngine, ThrottledEngine};

/// Shared across all workers; cloned into each one by actix.
#[derive(Clone)]
pub struct AppState {
    pub budget_service: Arc<BudgetPdfService>,
}

impl AppState {
    pub fn new(budget_service: BudgetPdfService) -> Self {
        Self {
            budget_service: Arc::new(budget_service),
        }
    }

    /// Wire the production pipeline: system clock, Chromium behind a bounded
    /// number of render slots, and the fonts found in `config.fonts_dir`.
    pub fn from_config(config: &AppConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let numbers = BudgetNumberGenerator::new(config.budget_counter_seed, clock.clone());

        let assets = match TemplateAssets::with_fonts_dir(&config.fonts_dir) {
            Ok(assets) => {
                log::info!(
                    "Loaded {} embedded font(s) from {}",
                    assets.fonts().len(),
                    config.fonts_dir.display()
                );
                assets
            }
            Err(e) => {
                log::error!("Failed to load fonts, using system fonts instead: {}", e);
                TemplateAssets::builtin()
            }
        };

        let engine = ThrottledEngine::new(
            ChromePdfEngine::new(config.chrome_config()),
            config.max_concurrent_renders,
            config.queue_timeout,
        );
        log::info!(
            "PDF engine ready: {} render slot(s), {:?} render deadline",
            engine.capacity(),
            config.render_timeout
        );

        Self::new(BudgetPdfService::new(
            numbers,
            clock,
            BudgetTemplate::new(assets),
            Arc::new(engine),
        ))
    }
}
