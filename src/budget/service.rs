//! The budget pipeline: validate, assign number and timestamp, render HTML, convert to PDF.

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::clock::Clock;
use super::models::{BudgetPayload, BudgetRequest};
use super::numbering::BudgetNumberGenerator;
use super::template::BudgetTemplate;
use super::validation::validate_payload;
use super::{BudgetError, GeneratedBudget};
use crate::pdf::{PdfEngine, PdfOptions};

/// HTML ready for conversion, with the identifiers it was rendered with.
#[derive(Debug, Clone)]
pub struct PreparedBudget {
    pub budget_number: String,
    pub generated_at: DateTime<FixedOffset>,
    pub html: String,
}

pub struct BudgetPdfService {
    numbers: BudgetNumberGenerator,
    clock: Arc<dyn Clock>,
    template: BudgetTemplate,
    engine: Arc<dyn PdfEngine>,
    options: PdfOptions,
}

impl BudgetPdfService {
    pub fn new(
        numbers: BudgetNumberGenerator,
        clock: Arc<dyn Clock>,
        template: BudgetTemplate,
        engine: Arc<dyn PdfEngine>,
    ) -> Self {
        Self {
            numbers,
            clock,
            template,
            engine,
            options: PdfOptions::a4(),
        }
    }

    pub fn with_options(mut self, options: PdfOptions) -> Self {
        self.options = options;
        self
    }

    pub fn numbers(&self) -> &BudgetNumberGenerator {
        &self.numbers
    }

    /// Validate `payload` and produce the PDF.
    ///
    /// Validation failures return before any number is issued or the engine is touched.
    pub async fn generate(&self, payload: BudgetPayload) -> Result<GeneratedBudget, BudgetError> {
        let request = validate_payload(payload).map_err(|errors| {
            log::info!("Rejected budget request: {} invalid field(s)", errors.len());
            BudgetError::Validation(errors)
        })?;
        self.generate_validated(request).await
    }

    /// Produce the PDF for an already validated request.
    pub async fn generate_validated(
        &self,
        request: BudgetRequest,
    ) -> Result<GeneratedBudget, BudgetError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let prepared = self.prepare(request);

        log::info!(
            "[{}] Generating budget {} ({} bytes of HTML)",
            request_id,
            prepared.budget_number,
            prepared.html.len()
        );

        let pdf = self
            .engine
            .render(&prepared.html, &self.options)
            .await
            .map_err(|e| {
                log::error!(
                    "[{}] Budget {} failed to render ({}): {}",
                    request_id,
                    prepared.budget_number,
                    e.kind(),
                    e
                );
                BudgetError::Render(e)
            })?;

        log::info!(
            "[{}] Budget {} rendered: {} bytes in {:?}",
            request_id,
            prepared.budget_number,
            pdf.len(),
            started.elapsed()
        );

        Ok(GeneratedBudget {
            budget_number: prepared.budget_number,
            pdf,
        })
    }

    /// Fill in the budget number and generation time when the caller left them
    /// out, then render the HTML.
    ///
    /// A caller-supplied `generatedAt` in RFC 3339 form is used for the banner;
    /// anything else falls back to the clock.
    pub fn prepare(&self, mut request: BudgetRequest) -> PreparedBudget {
        if !request.total_matches_line_items() {
            log::warn!(
                "totalPrice {} differs from line items {}; rendering the submitted total",
                request.total_price,
                request.computed_total()
            );
        }

        let budget_number = request
            .budget_number
            .get_or_insert_with(|| self.numbers.next())
            .clone();

        let generated_at = request
            .generated_at
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .unwrap_or_else(|| self.clock.now());
        request
            .generated_at
            .get_or_insert_with(|| generated_at.to_rfc3339());

        let html = self.template.render(&request, &budget_number, &generated_at);

        PreparedBudget {
            budget_number,
            generated_at,
            html,
        }
    }
}
