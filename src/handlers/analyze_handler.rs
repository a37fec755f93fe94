use actix_web::{web, HttpResponse};
use log::{error, info, warn};
use serde_json::Value;

use crate::models::analysis::{AnalysisResult, ErrorResponse, LabelScore};
use crate::models::email_request::EmailRequest;
use crate::routes::app_state::AppState;
use crate::services::classifier_service::ClassifierError;
use crate::services::reply_service;

pub async fn handle_analyze_request(data: web::Data<AppState>, req_body: web::Json<Value>) -> HttpResponse {
    let request = match EmailRequest::from_payload(req_body.into_inner()) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting analyze request: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::no_text());
        }
    };

    match analyze_email(&data, &request).await {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => {
            error!("Error in analyze_label: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(e.to_string()))
        }
    }
}

/// Classifies the email, remaps the label and drafts a reply.
///
/// Classification errors are returned; generation errors end up in `output`.
pub async fn analyze_email(state: &AppState, request: &EmailRequest) -> Result<AnalysisResult, ClassifierError> {
    let predictions = state
        .model_loader
        .classify(request.classification_text())
        .await?;
    let result: Vec<LabelScore> = predictions.into_iter().map(LabelScore::remapped).collect();

    let label = result
        .first()
        .map(|score| score.label.clone())
        .ok_or_else(|| ClassifierError::InferenceError("classifier returned no labels".to_string()))?;
    info!("Classified email as {}", label);

    let output = reply_service::draft_reply(
        state.reply_generator.as_ref(),
        request.subject(),
        &request.body,
        &label,
    )
    .await;

    Ok(AnalysisResult { result, output })
}
