//! Public contact form. Messages are validated and logged; nothing is stored.

use axum::{response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ApiError, ApiJson};
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::security::validation::{normalize_email, ValidationResult};

const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: &'static str,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.required("firstName", &self.first_name)
            .required("lastName", &self.last_name)
            .email("email", &self.email)
            .required("subject", &self.subject)
            .required("message", &self.message)
            .max_length("message", &self.message, MAX_MESSAGE_LENGTH);
        v.into_result()
    }
}

pub async fn submit_contact(
    ApiJson(req): ApiJson<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    req.validate()?;

    info!(
        from = %normalize_email(&req.email),
        name = %format!("{} {}", req.first_name.trim(), req.last_name.trim()),
        subject = %req.subject.trim(),
        "Contact form submission: {}",
        req.message.trim()
    );

    Ok(Json(ContactResponse {
        message: "Message sent successfully",
    }))
}

pub fn configure_contact_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::CONTACT, post(submit_contact))
}
