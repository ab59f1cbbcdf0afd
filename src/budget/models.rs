//! Budget data model.
//!
//! `*Payload` types mirror the inbound JSON and accept missing fields so that
//! validation can report every problem at once. `validation::validate_payload`
//! turns a `BudgetPayload` into the typed `BudgetRequest` the pipeline consumes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfoPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageFeature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageTypePayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<f64>,
    pub estimated_days: Option<i64>,
    #[serde(default)]
    pub features: Vec<PageFeature>,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalFeaturePayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

/// Inbound body of `POST /api/budget/generate`.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    pub client_info: Option<ClientInfoPayload>,
    pub page_type: Option<PageTypePayload>,
    #[serde(default)]
    pub additional_features: Vec<AdditionalFeaturePayload>,
    /// One of `urgent`, `normal`, `extended`. Defaults to `normal`.
    #[schema(example = "normal")]
    pub timeline: Option<String>,
    /// Falls back to `pageType.estimatedDays` when absent.
    pub estimated_days: Option<i64>,
    /// Pre-formatted delivery date shown verbatim.
    pub delivery_date: Option<String>,
    /// Falls back to `basePrice + sum(additionalFeatures.price)` when absent.
    pub total_price: Option<f64>,
    pub generated_at: Option<String>,
    pub budget_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPageType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub estimated_days: Option<u32>,
    pub features: Vec<PageFeature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdditionalFeature {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    Urgent,
    #[default]
    Normal,
    Extended,
}

impl Timeline {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" => Some(Self::Urgent),
            "normal" => Some(Self::Normal),
            "extended" => Some(Self::Extended),
            _ => None,
        }
    }

    /// Phrase printed in the delivery section.
    pub fn label(self) -> &'static str {
        match self {
            Self::Urgent => "Urgente",
            Self::Extended => "Flexible",
            Self::Normal => "Normal",
        }
    }
}

/// Validated quote, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRequest {
    pub client_info: ClientInfo,
    pub page_type: SelectedPageType,
    pub additional_features: Vec<AdditionalFeature>,
    pub timeline: Timeline,
    pub estimated_days: u32,
    pub delivery_date: Option<String>,
    pub total_price: f64,
    pub generated_at: Option<String>,
    pub budget_number: Option<String>,
}

impl BudgetRequest {
    /// `basePrice` plus every add-on price.
    pub fn computed_total(&self) -> f64 {
        self.page_type.base_price
            + self
                .additional_features
                .iter()
                .map(|feature| feature.price)
                .sum::<f64>()
    }

    /// Whether the caller's `totalPrice` agrees with the line items to the cent.
    pub fn total_matches_line_items(&self) -> bool {
        (self.total_price - self.computed_total()).abs() < 0.005
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_deserialization_camel_case() {
        let json = r#"{
            "clientInfo": { "name": "Juan Pérez", "email": "juan@example.com", "company": "ACME" },
            "pageType": { "id": "landing", "name": "Landing Page", "basePrice": 250, "estimatedDays": 7, "features": [] },
            "additionalFeatures": [{ "name": "SEO", "price": 100, "description": "", "benefits": [] }],
            "timeline": "urgent",
            "deliveryDate": "30 de octubre de 2026",
            "totalPrice": 350
        }"#;

        let payload: BudgetPayload = serde_json::from_str(json).unwrap();
        let client = payload.client_info.unwrap();
        assert_eq!(client.name.as_deref(), Some("Juan Pérez"));
        assert_eq!(client.company.as_deref(), Some("ACME"));
        assert_eq!(client.description, None);

        let page = payload.page_type.unwrap();
        assert_eq!(page.base_price, Some(250.0));
        assert_eq!(page.estimated_days, Some(7));
        assert_eq!(payload.additional_features[0].price, Some(100.0));
        assert_eq!(payload.total_price, Some(350.0));
        assert_eq!(payload.budget_number, None);
    }

    #[test]
    fn test_empty_object_is_accepted_by_the_payload() {
        let payload: BudgetPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.client_info.is_none());
        assert!(payload.page_type.is_none());
        assert!(payload.additional_features.is_empty());
    }

    #[test]
    fn test_timeline_labels() {
        assert_eq!(Timeline::parse("urgent").map(Timeline::label), Some("Urgente"));
        assert_eq!(Timeline::parse("EXTENDED").map(Timeline::label), Some("Flexible"));
        assert_eq!(Timeline::parse("normal").map(Timeline::label), Some("Normal"));
        assert_eq!(Timeline::default().label(), "Normal");
        assert_eq!(Timeline::parse("someday"), None);
    }
}
