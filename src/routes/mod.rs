use actix_web::web;

pub mod analyze_routes;
pub mod app_state;
pub mod health_routes;

/// Registers every endpoint the service exposes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    analyze_routes::init_routes(cfg);
    health_routes::init_routes(cfg);
}
