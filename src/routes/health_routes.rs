use actix_web::{get, web, Responder};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check).service(root);
}

#[get("/health")]
async fn health_check() -> impl Responder {
    crate::handlers::health_handler::health_check().await
}

#[get("/")]
async fn root() -> impl Responder {
    crate::handlers::health_handler::root().await
}
