use actix_web::{
    error::InternalError,
    http::header::{ContentDisposition, ContentType, DispositionParam, DispositionType},
    web::{self, Json, Path},
    HttpResponse, Responder,
};
use log::{debug, error, info};

use crate::generators::validation::{validate_parties, ValidationErrors};
use crate::generators::Validator;
use crate::invoice::models::InvoiceData;
use crate::storage::StoreError;
use crate::{AppState, ErrorResponse};

const GENERATE_FAILED: &str = "Error generating PDF";

fn bad_request(errors: &ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::bad_request(&errors.to_string()))
}

/// Malformed or mistyped bodies become a 400 with an `ErrorResponse`.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        error!("Rejecting invoice payload: {}", err);
        let response = HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()));
        InternalError::from_response(err, response).into()
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice PDF",
    post,
    path = "/pdf/generate",
    request_body(content = InvoiceData, content_type = "application/json"),
    responses(
        (status = 200, description = "PDF generated or already present", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed payload or invalid seller/buyer", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = String, content_type = "text/plain")
    )
)]
pub async fn generate_pdf(body: Json<InvoiceData>, data: web::Data<AppState>) -> impl Responder {
    let invoice = body.into_inner();
    info!(
        "Executing generate_pdf for seller '{}' and buyer '{}'",
        invoice.seller, invoice.buyer
    );

    if let Err(errors) = invoice.validate() {
        error!("Invoice validation failed: {}", errors);
        return bad_request(&errors);
    }

    match data.store.generate(&invoice).await {
        Ok(path) => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(format!("PDF generated successfully at: {}", path.display())),
        Err(e) => {
            error!("Error generating PDF: {}", e);
            HttpResponse::InternalServerError()
                .content_type(ContentType::plaintext())
                .body(GENERATE_FAILED)
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice PDF",
    get,
    path = "/pdf/download/{seller}/{buyer}",
    params(
        ("seller" = String, Path, description = "Seller name as submitted"),
        ("buyer" = String, Path, description = "Buyer name as submitted")
    ),
    responses(
        (status = 200, description = "PDF file as an attachment", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Seller or buyer cannot name a stored file", body = ErrorResponse),
        (status = 404, description = "No PDF generated for this pair"),
        (status = 500, description = "PDF could not be read")
    )
)]
pub async fn download_pdf(path: Path<(String, String)>, data: web::Data<AppState>) -> impl Responder {
    let (seller, buyer) = path.into_inner();
    info!(
        "Executing download_pdf for seller '{}' and buyer '{}'",
        seller, buyer
    );

    let mut errors = ValidationErrors::new();
    validate_parties(&seller, &buyer, &mut errors);
    if !errors.is_empty() {
        error!("Download rejected: {}", errors);
        return bad_request(&errors);
    }

    match data.store.fetch(&seller, &buyer).await {
        Ok(document) => {
            debug!(
                "Serving {} ({} bytes)",
                document.path.display(),
                document.bytes.len()
            );
            HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(document.file_name)],
                })
                .body(document.bytes)
        }
        Err(StoreError::NotFound(path)) => {
            error!("File does not exist at path: {}", path.display());
            HttpResponse::NotFound().finish()
        }
        Err(e) => {
            error!("Error downloading PDF: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/pdf/generate").route(web::post().to(generate_pdf)))
        .service(
            web::resource("/pdf/download/{seller}/{buyer}")
                .route(web::get().to(download_pdf)),
        );
}
