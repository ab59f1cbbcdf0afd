//! Request validation for budget generation.
//!
//! Collects every problem in the payload before answering, so the caller gets
//! one itemized message instead of fixing fields one round-trip at a time.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::models::{
    AdditionalFeature, AdditionalFeaturePayload, BudgetPayload, BudgetRequest, ClientInfo,
    ClientInfoPayload, PageTypePayload, SelectedPageType, Timeline,
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// JSON path of the field, e.g. `clientInfo.email`
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, "es obligatorio")
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::new(field, "no es un correo electrónico válido")
    }

    pub fn negative_amount(field: &str) -> Self {
        Self::new(field, "debe ser un número mayor o igual a 0")
    }

    pub fn not_positive(field: &str) -> Self {
        Self::new(field, "debe ser un número entero mayor que 0")
    }

    pub fn unknown_timeline(field: &str, value: &str) -> Self {
        Self::new(
            field,
            format!("'{value}' no es válido (valores permitidos: urgent, normal, extended)"),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// All problems found in one payload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|error| error.field.as_str())
    }

    /// Human-readable, numbered message returned to the caller.
    pub fn to_message(&self) -> String {
        let mut parts = vec![format!(
            "Datos del presupuesto inválidos ({} {}):",
            self.errors.len(),
            if self.errors.len() == 1 { "error" } else { "errores" }
        )];

        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }

        parts.join("\n")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_message())
    }
}

impl std::error::Error for ValidationErrors {}

// ============================================================================
// Field checks
// ============================================================================

/// Non-blank string, trimmed.
fn required_text(value: Option<&str>, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            errors.add(ValidationError::missing(field));
            None
        }
    }
}

/// Blank strings count as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn required_amount(value: Option<f64>, field: &str, errors: &mut ValidationErrors) -> Option<f64> {
    match value {
        None => {
            errors.add(ValidationError::missing(field));
            None
        }
        Some(amount) => checked_amount(amount, field, errors),
    }
}

fn checked_amount(amount: f64, field: &str, errors: &mut ValidationErrors) -> Option<f64> {
    if amount.is_finite() && amount >= 0.0 {
        Some(amount)
    } else {
        errors.add(ValidationError::negative_amount(field));
        None
    }
}

fn checked_days(days: i64, field: &str, errors: &mut ValidationErrors) -> Option<u32> {
    match u32::try_from(days) {
        Ok(days) if days > 0 => Some(days),
        _ => {
            errors.add(ValidationError::not_positive(field));
            None
        }
    }
}

fn validate_client(payload: ClientInfoPayload, errors: &mut ValidationErrors) -> Option<ClientInfo> {
    let name = required_text(payload.name.as_deref(), "clientInfo.name", errors);
    let email = required_text(payload.email.as_deref(), "clientInfo.email", errors);

    if let Some(email) = &email {
        if !EMAIL_RE.is_match(email) {
            errors.add(ValidationError::invalid_email("clientInfo.email"));
        }
    }

    Some(ClientInfo {
        name: name?,
        email: email?,
        company: optional_text(payload.company),
        description: optional_text(payload.description),
    })
}

fn validate_page_type(
    payload: PageTypePayload,
    errors: &mut ValidationErrors,
) -> Option<SelectedPageType> {
    let name = required_text(payload.name.as_deref(), "pageType.name", errors);
    let base_price = required_amount(payload.base_price, "pageType.basePrice", errors);
    let estimated_days = match payload.estimated_days {
        Some(days) => Some(checked_days(days, "pageType.estimatedDays", errors)?),
        None => None,
    };

    Some(SelectedPageType {
        id: payload.id.unwrap_or_default(),
        name: name?,
        description: payload.description.unwrap_or_default(),
        base_price: base_price?,
        estimated_days,
        features: payload.features,
    })
}

fn validate_additional_feature(
    index: usize,
    payload: AdditionalFeaturePayload,
    errors: &mut ValidationErrors,
) -> Option<AdditionalFeature> {
    let name = required_text(
        payload.name.as_deref(),
        &format!("additionalFeatures[{index}].name"),
        errors,
    );
    let price = required_amount(
        payload.price,
        &format!("additionalFeatures[{index}].price"),
        errors,
    );

    Some(AdditionalFeature {
        id: payload.id.unwrap_or_default(),
        name: name?,
        price: price?,
        description: payload.description.unwrap_or_default(),
        benefits: payload.benefits,
    })
}

/// Validate an inbound payload and convert it into a `BudgetRequest`.
///
/// Required: `clientInfo`, `clientInfo.name`, `clientInfo.email`, `pageType`,
/// `pageType.name`, `pageType.basePrice`. Also rejects malformed emails,
/// negative or non-finite prices, non-positive day counts and unknown
/// timelines. `totalPrice` is accepted as sent; when absent it is computed
/// from the line items.
pub fn validate_payload(payload: BudgetPayload) -> Result<BudgetRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let client_info = match payload.client_info {
        Some(client) => validate_client(client, &mut errors),
        None => {
            errors.add(ValidationError::missing("clientInfo"));
            None
        }
    };

    let page_type = match payload.page_type {
        Some(page) => validate_page_type(page, &mut errors),
        None => {
            errors.add(ValidationError::missing("pageType"));
            None
        }
    };

    let additional_features: Vec<Option<AdditionalFeature>> = payload
        .additional_features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| validate_additional_feature(index, feature, &mut errors))
        .collect();

    let timeline = match payload.timeline.as_deref() {
        None => Some(Timeline::default()),
        Some(value) => {
            let parsed = Timeline::parse(value);
            if parsed.is_none() {
                errors.add(ValidationError::unknown_timeline("timeline", value));
            }
            parsed
        }
    };

    let estimated_days = match payload.estimated_days {
        Some(days) => checked_days(days, "estimatedDays", &mut errors),
        None => match &page_type {
            Some(page) => {
                let fallback = page.estimated_days;
                if fallback.is_none() {
                    errors.add(ValidationError::missing("estimatedDays"));
                }
                fallback
            }
            // pageType already reported
            None => None,
        },
    };

    let total_price = match payload.total_price {
        Some(total) => checked_amount(total, "totalPrice", &mut errors),
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // Every check passed, so each piece below is present.
    let (Some(client_info), Some(page_type), Some(timeline), Some(estimated_days)) =
        (client_info, page_type, timeline, estimated_days)
    else {
        return Err(errors);
    };
    let additional_features: Vec<AdditionalFeature> =
        additional_features.into_iter().flatten().collect();

    let mut request = BudgetRequest {
        client_info,
        page_type,
        additional_features,
        timeline,
        estimated_days,
        delivery_date: optional_text(payload.delivery_date),
        total_price: 0.0,
        generated_at: optional_text(payload.generated_at),
        budget_number: optional_text(payload.budget_number),
    };
    request.total_price = total_price.unwrap_or_else(|| request.computed_total());

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> BudgetPayload {
        serde_json::from_value(value).unwrap()
    }

    fn valid_json() -> serde_json::Value {
        json!({
            "clientInfo": { "name": "Juan Pérez", "email": "juan@example.com" },
            "pageType": { "name": "Landing Page", "basePrice": 250, "estimatedDays": 7, "features": [] },
            "additionalFeatures": [{ "name": "SEO", "price": 100, "description": "", "benefits": [] }],
            "timeline": "normal",
            "totalPrice": 350
        })
    }

    #[test]
    fn test_valid_payload_converts() {
        let request = validate_payload(payload(valid_json())).unwrap();
        assert_eq!(request.client_info.name, "Juan Pérez");
        assert_eq!(request.client_info.company, None);
        assert_eq!(request.page_type.base_price, 250.0);
        assert_eq!(request.additional_features.len(), 1);
        assert_eq!(request.timeline, Timeline::Normal);
        assert_eq!(request.estimated_days, 7);
        assert_eq!(request.total_price, 350.0);
        assert!(request.total_matches_line_items());
    }

    #[test]
    fn test_missing_client_and_page_type() {
        let errors = validate_payload(BudgetPayload::default()).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["clientInfo", "pageType"]);
    }

    #[test]
    fn test_missing_required_subfields_are_itemized() {
        let errors = validate_payload(payload(json!({
            "clientInfo": { "name": "  " },
            "pageType": { "description": "sin nombre" }
        })))
        .unwrap_err();

        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec![
                "clientInfo.name",
                "clientInfo.email",
                "pageType.name",
                "pageType.basePrice"
            ]
        );

        let message = errors.to_message();
        assert!(message.contains("4 errores"));
        assert!(message.contains("1. clientInfo.name es obligatorio"));
        assert!(message.contains("4. pageType.basePrice es obligatorio"));
    }

    #[test]
    fn test_zero_base_price_is_accepted() {
        let mut value = valid_json();
        value["pageType"]["basePrice"] = json!(0);
        value["totalPrice"] = json!(100);
        assert!(validate_payload(payload(value)).is_ok());
    }

    #[test]
    fn test_rejects_bad_email_negative_prices_and_unknown_timeline() {
        let mut value = valid_json();
        value["clientInfo"]["email"] = json!("juan-at-example");
        value["additionalFeatures"][0]["price"] = json!(-5);
        value["timeline"] = json!("yesterday");
        value["estimatedDays"] = json!(0);

        let errors = validate_payload(payload(value)).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec![
                "clientInfo.email",
                "additionalFeatures[0].price",
                "timeline",
                "estimatedDays"
            ]
        );
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let value = json!({
            "clientInfo": { "name": "Ana", "email": "ana@example.com", "company": "", "description": "  " },
            "pageType": { "name": "E-commerce", "basePrice": 900, "estimatedDays": 21 },
            "additionalFeatures": [{ "name": "Blog", "price": 120.5 }]
        });

        let request = validate_payload(payload(value)).unwrap();
        assert_eq!(request.client_info.company, None);
        assert_eq!(request.client_info.description, None);
        assert_eq!(request.timeline, Timeline::Normal);
        assert_eq!(request.estimated_days, 21);
        assert_eq!(request.total_price, 1020.5);
        assert_eq!(request.delivery_date, None);
    }

    #[test]
    fn test_estimated_days_required_when_page_type_has_none() {
        let value = json!({
            "clientInfo": { "name": "Ana", "email": "ana@example.com" },
            "pageType": { "name": "Blog", "basePrice": 300 }
        });

        let errors = validate_payload(payload(value)).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["estimatedDays"]);
    }

    #[test]
    fn test_caller_total_is_kept_even_when_it_disagrees() {
        let mut value = valid_json();
        value["totalPrice"] = json!(500);
        let request = validate_payload(payload(value)).unwrap();
        assert_eq!(request.total_price, 500.0);
        assert!(!request.total_matches_line_items());
    }
}
