use actix_cors::Cors;
use actix_web::middleware::{Compress, Logger};
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod budget;
pub mod config;
pub mod health;
pub mod pdf;
pub mod state;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::health::health,
        crate::health::api_info,
        crate::budget::handlers::generate_budget_pdf
    ),
    components(
        schemas(
            budget::models::BudgetPayload,
            budget::models::ClientInfoPayload,
            budget::models::PageTypePayload,
            budget::models::PageFeature,
            budget::models::AdditionalFeaturePayload,
            health::HealthResponse,
            health::ApiInfoResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Budget", description = "Quote PDF generation."),
        (name = "Health", description = "Liveness and API information.")
    )
)]
pub struct ApiDoc;

/// All routes, including docs and the JSON 404 fallback.
///
/// JSON and documentation responses are compressed. Budget PDFs are not:
/// they are already compressed and are sent with an exact `Content-Length`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/health")
            .wrap(Compress::default())
            .route(web::get().to(health::health)),
    )
    .service(
        web::scope("/api")
            .service(
                web::resource(["", "/"])
                    .wrap(Compress::default())
                    .route(web::get().to(health::api_info)),
            )
            .configure(budget::handlers::config),
    )
    .service(
        web::scope("")
            .wrap(Compress::default())
            .service(SwaggerUi::new("/docs/{_:.*}").url("/openapi.json", ApiDoc::openapi())),
    )
    .default_service(web::route().to(health::not_found));
}

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let app_state = web::Data::new(AppState::from_config(&config));

    let prometheus = PrometheusMetricsBuilder::new("presupuesto_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(format!("failed to create metrics middleware: {e}")))?;

    log::info!(
        "Starting server at http://{}:{} ({})",
        config.host,
        config.port,
        config.environment
    );
    log::info!("API docs at http://{}:{}/docs/", config.host, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);

        App::new()
            .wrap(prometheus.clone())
            .wrap(cors)
            .wrap(Logger::new("%a \"%r\" %s %b %Dms"))
            .app_data(app_state.clone())
            .configure(routes)
    })
    .backlog(1024)
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
