use actix_web::error::{self, JsonPayloadError};
use actix_web::{post, web, HttpResponse, Responder};
use log::warn;
use serde_json::Value;

use crate::config::MAX_REQUEST_BYTES;
use crate::models::analysis::ErrorResponse;
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(analyze_label);
}

/// Oversized bodies get a 413. Anything else unreadable gets the same 400 as a
/// JSON body without `body`.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_REQUEST_BYTES)
        .content_type_required(false)
        .error_handler(|err, _req| {
            let response = match &err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    warn!("Rejecting oversized request body: {}", err);
                    HttpResponse::PayloadTooLarge().json(ErrorResponse::too_large())
                }
                _ => {
                    warn!("Rejecting unreadable request body: {}", err);
                    HttpResponse::BadRequest().json(ErrorResponse::no_text())
                }
            };
            error::InternalError::from_response(err, response).into()
        })
}

#[post("/analyze-label")]
async fn analyze_label(data: web::Data<AppState>, req_body: web::Json<Value>) -> impl Responder {
    crate::handlers::analyze_handler::handle_analyze_request(data, req_body).await
}
