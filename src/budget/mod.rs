//! Budget (quote) generation: validation, numbering, HTML rendering and PDF output.
//!
//! - `validation` - payload checks, itemized errors
//! - `numbering` - `PRES-YYYYMM-N` identifiers
//! - `currency` - locale-independent USD formatting
//! - `template` - self-contained HTML document
//! - `service` - the pipeline tying the above to a `PdfEngine`
//! - `handlers` - HTTP endpoint

pub mod clock;
pub mod currency;
pub mod handlers;
pub mod models;
pub mod numbering;
pub mod service;
pub mod template;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{BudgetPayload, BudgetRequest, Timeline};
pub use numbering::BudgetNumberGenerator;
pub use service::BudgetPdfService;
pub use template::{BudgetTemplate, TemplateAssets};
pub use validation::{validate_payload, ValidationError, ValidationErrors};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::pdf::RenderError;
use crate::ErrorResponse;

/// Message returned to the client for every server-side failure.
pub const RENDER_FAILURE_MESSAGE: &str = "Error al generar el PDF del presupuesto";

/// Errors that can occur while generating a budget.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("invalid budget request: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("failed to render budget PDF: {0}")]
    Render(#[from] RenderError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for BudgetError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(errors) => ErrorResponse::new(errors.to_message()),
            Self::Render(_) | Self::Internal(_) => ErrorResponse::new(RENDER_FAILURE_MESSAGE),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// A rendered budget, ready to be sent.
#[derive(Debug)]
pub struct GeneratedBudget {
    pub budget_number: String,
    pub pdf: Vec<u8>,
}
