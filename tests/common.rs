#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use presupuesto_server::budget::clock::{Clock, FixedClock};
use presupuesto_server::budget::numbering::BudgetNumberGenerator;
use presupuesto_server::budget::service::BudgetPdfService;
use presupuesto_server::budget::template::BudgetTemplate;
use presupuesto_server::pdf::{PdfEngine, PdfOptions, RenderError};
use presupuesto_server::AppState;

pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n% presupuesto de prueba\n%%EOF";

/// Counts calls and returns a fixed PDF.
#[derive(Default)]
pub struct SpyEngine {
    calls: AtomicUsize,
}

impl SpyEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfEngine for SpyEngine {
    async fn render(&self, html: &str, _options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        assert!(html.starts_with("<!DOCTYPE html>"));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FAKE_PDF.to_vec())
    }
}

/// Always fails as if the browser could not be started.
pub struct FailingEngine;

#[async_trait]
impl PdfEngine for FailingEngine {
    async fn render(&self, _html: &str, _options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::EngineUnavailable(
            "chromium exited with status 127".to_string(),
        ))
    }
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::parse("2026-10-16T10:00:00-05:00").unwrap())
}

pub fn test_state(engine: Arc<dyn PdfEngine>) -> AppState {
    let clock = fixed_clock();
    AppState::new(BudgetPdfService::new(
        BudgetNumberGenerator::new(1000, clock.clone()),
        clock,
        BudgetTemplate::default(),
        engine,
    ))
}

pub fn sample_payload() -> Value {
    json!({
        "clientInfo": {
            "name": "Juan Pérez",
            "email": "juan@example.com",
            "company": "Acme S.A.",
            "description": "Sitio corporativo con blog"
        },
        "pageType": {
            "id": "landing",
            "name": "Landing Page",
            "description": "Una página de aterrizaje",
            "basePrice": 250,
            "estimatedDays": 7,
            "features": [
                { "name": "Diseño responsivo", "description": "Se adapta a móviles" }
            ]
        },
        "additionalFeatures": [
            { "id": "seo", "name": "SEO", "price": 100, "description": "Optimización básica" }
        ],
        "timeline": "normal",
        "estimatedDays": 7,
        "deliveryDate": "23/10/2026",
        "totalPrice": 350
    })
}
