pub mod classifier_service;
pub mod gemini_client;
pub mod pipeline;
pub mod reply_service;
