use actix_web::HttpResponse;
use serde_json::json;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "healthy"}))
}

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({"message": "Bolt API is running"}))
}
