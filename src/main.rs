use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use bolt_api::config::{self, AppConfig};
use bolt_api::routes::{self, app_state::AppState};
use bolt_api::services::classifier_service::{ModelLoader, PretrainedLoader};
use bolt_api::services::gemini_client::GeminiClient;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    config::init_logging();
    config::apply_memory_tuning();

    let app_config = AppConfig::from_env()?;
    if app_config.gemini_key.is_none() {
        log::warn!("GEMINI_KEY is not set; reply generation will fail");
    }

    let gemini = GeminiClient::from_config(&app_config)?;
    log::info!("Gemini client ready ({})", gemini.model());

    let state = web::Data::new(AppState {
        model_loader: ModelLoader::new(Arc::new(PretrainedLoader::from_config(&app_config))),
        reply_generator: Arc::new(gemini),
    });

    log::info!("Starting server on http://{}:{}", app_config.host, app_config.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind((app_config.host.as_str(), app_config.port))?
    .run()
    .await?;

    Ok(())
}
