use actix_cors::Cors;
use actix_web::middleware::{Compress, Logger};
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod generators;
pub mod invoice;
pub mod state;
pub mod storage;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::invoice::handlers::generate_pdf,
        crate::invoice::handlers::download_pdf,
    ),
    components(
        schemas(
            invoice::models::InvoiceData,
            invoice::models::LineItem,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Invoice PDF", description = "Invoice PDF generation and download.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app_state = web::Data::new(AppState::new(&config));

    let prometheus = PrometheusMetricsBuilder::new("invoice_pdf_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {:?}", e))?;

    log::info!(
        "Storing PDFs under {}, starting server at http://{}:{}",
        config.storage_dir.display(),
        config.host,
        config.port
    );

    let origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);
        for origin in &origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .service(web::scope("/api").configure(invoice::handlers::config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
