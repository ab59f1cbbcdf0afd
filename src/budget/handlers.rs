use actix_web::http::header;
use actix_web::{error, web, HttpResponse};
use sanitize_filename::sanitize;

use super::models::BudgetPayload;
use super::{BudgetError, GeneratedBudget};
use crate::{AppState, ErrorResponse};

/// Largest accepted request body.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

const FILENAME_FALLBACK: &str = "presupuesto";

#[utoipa::path(
    post,
    path = "/api/budget/generate",
    tag = "Budget",
    request_body = BudgetPayload,
    responses(
        (status = 200, description = "Budget PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Missing or invalid fields, or malformed JSON", body = ErrorResponse),
        (status = 500, description = "The PDF could not be generated", body = ErrorResponse)
    )
)]
pub async fn generate_budget_pdf(
    state: web::Data<AppState>,
    payload: web::Json<BudgetPayload>,
) -> Result<HttpResponse, BudgetError> {
    let generated = state.budget_service.generate(payload.into_inner()).await?;
    pdf_response(generated)
}

/// `Presupuesto-<number>.pdf`, restricted to characters safe in a quoted header value.
pub fn attachment_filename(budget_number: &str) -> String {
    let cleaned: String = sanitize(budget_number)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        format!("Presupuesto-{FILENAME_FALLBACK}.pdf")
    } else {
        format!("Presupuesto-{cleaned}.pdf")
    }
}

/// The PDF as an attachment, with its exact length.
pub fn pdf_response(generated: GeneratedBudget) -> Result<HttpResponse, BudgetError> {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&generated.budget_number)
    );
    let disposition = header::HeaderValue::from_str(&disposition)
        .map_err(|e| BudgetError::Internal(format!("invalid Content-Disposition: {e}")))?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((header::CONTENT_DISPOSITION, disposition))
        .insert_header((header::CONTENT_LENGTH, generated.pdf.len()))
        .body(generated.pdf))
}

/// Malformed or oversized bodies get the same JSON error shape as validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            log::info!("Rejected budget request body: {}", err);
            let response = HttpResponse::BadRequest().json(ErrorResponse::new(format!(
                "Cuerpo de la solicitud inválido: {err}"
            )));
            error::InternalError::from_response(err, response).into()
        })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::resource("/budget/generate").route(web::post().to(generate_budget_pdf)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("PRES-202610-1001"),
            "Presupuesto-PRES-202610-1001.pdf"
        );
    }

    #[test]
    fn test_attachment_filename_strips_unsafe_characters() {
        assert_eq!(
            attachment_filename("../PRES \"x\"/1;rm"),
            "Presupuesto-PRESx1rm.pdf"
        );
        assert_eq!(attachment_filename("año-1"), "Presupuesto-ao-1.pdf");
    }

    #[test]
    fn test_attachment_filename_fallback() {
        assert_eq!(attachment_filename(""), "Presupuesto-presupuesto.pdf");
        assert_eq!(attachment_filename("../.."), "Presupuesto-presupuesto.pdf");
        assert_eq!(attachment_filename("ñ"), "Presupuesto-presupuesto.pdf");
    }

    #[test]
    fn test_pdf_response_headers() {
        let response = pdf_response(GeneratedBudget {
            budget_number: "PRES-202610-1001".to_string(),
            pdf: b"%PDF-1.4 body".to_vec(),
        })
        .unwrap();

        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"Presupuesto-PRES-202610-1001.pdf\""
        );
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "13");
        assert!(headers.get(header::CONTENT_ENCODING).is_none());
    }
}
