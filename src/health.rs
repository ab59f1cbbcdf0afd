//! Liveness, API banner and the JSON 404 fallback.

use actix_web::{HttpResponse, Responder};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ErrorResponse;

pub const API_WELCOME_MESSAGE: &str = "Bienvenido a la API de Devanthos";
pub const NOT_FOUND_MESSAGE: &str = "Ruta no encontrada";

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiInfoResponse {
    pub success: bool,
    pub message: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[utoipa::path(
    get,
    path = "/api",
    tag = "Health",
    responses(
        (status = 200, description = "API banner", body = ApiInfoResponse)
    )
)]
pub async fn api_info() -> impl Responder {
    HttpResponse::Ok().json(ApiInfoResponse {
        success: true,
        message: API_WELCOME_MESSAGE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(NOT_FOUND_MESSAGE))
}
