//! Password sign-up and login issuing bearer tokens, plus the caller's profile.

pub mod users;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{ApiError, ApiJson};
use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::security::password::MIN_PASSWORD_LENGTH;
use crate::security::validation::{normalize_email, ValidationResult};

use self::users::{NewUser, User, UserStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".into())
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut validation = ValidationResult::new();
    validation
        .email("email", &req.email)
        .min_length("password", &req.password, MIN_PASSWORD_LENGTH);
    validation.into_result()?;

    let hasher = Arc::clone(&state.hasher);
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

    let new_user = NewUser::new(
        normalize_email(&req.email),
        password_hash,
        req.first_name.filter(|s| !s.trim().is_empty()),
        req.last_name.filter(|s| !s.trim().is_empty()),
    );
    let user = UserStore::new(state.conn.clone()).create_user(new_user).await?;
    let token = state.tokens.issue(user.id)?;

    info!("New account created: {}", user.id);
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut validation = ValidationResult::new();
    validation
        .email("email", &req.email)
        .required("password", &req.password);
    validation.into_result()?;

    let found = UserStore::new(state.conn.clone())
        .get_user_by_email(normalize_email(&req.email))
        .await?;

    // Unknown accounts still cost one Argon2 verification.
    let hasher = Arc::clone(&state.hasher);
    let password = req.password;
    let stored_hash = found.as_ref().map(|user| user.password_hash.clone());
    let matches = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => hasher.verify(&password, &hash),
        None => hasher.verify_decoy(&password),
    })
    .await?;

    let Some(user) = found else {
        debug!("Login attempt for unknown account");
        return Err(invalid_credentials());
    };
    if !matches {
        debug!("Wrong password for user {}", user.id);
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse { user, token }))
}

pub async fn current_user(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

/// Sign-up and login; the caller's profile route is mounted with the gate in
/// the API router.
pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::AUTH_SIGNUP, post(signup))
        .route(ApiUrls::AUTH_LOGIN, post(login))
}

pub fn configure_profile_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::AUTH_USER, get(current_user))
}
