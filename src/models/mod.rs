pub mod analysis;
pub mod email_request;
pub mod label;
