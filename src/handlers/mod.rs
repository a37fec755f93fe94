pub mod analyze_handler;
pub mod health_handler;
