use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::users::{User, UserStore};
use crate::core::error::ApiError;
use crate::core::shared::state::AppState;
use crate::security::jwt::extract_bearer_token;

// ============================================================================
// User Context (Authentication)
// ============================================================================

/// Authenticated user context attached to the request by
/// [`require_authentication`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Verifies the bearer token and loads the user it names. Any failure is a 401.
pub async fn require_authentication(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Access token required".into()))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {e}");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    let user = UserStore::new(state.conn.clone())
        .get_user(user_id)
        .await?
        .ok_or_else(|| {
            debug!("Token subject {user_id} no longer exists");
            ApiError::Unauthorized("User not found".into())
        })?;

    request.extensions_mut().insert(AuthenticatedUser::from(user));
    Ok(next.run(request).await)
}

/// Must be layered inside [`require_authentication`].
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))?;

    if !user.is_admin {
        debug!("User {} denied admin access", user.id);
        return Err(ApiError::Forbidden("Admin access required".into()));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Axum Extractors
// ============================================================================

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::state::test_state;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn user(is_admin: bool) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "learner@example.com".into(),
            first_name: None,
            last_name: None,
            is_admin,
        }
    }

    async fn whoami(user: AuthenticatedUser) -> String {
        user.email
    }

    fn gated_router() -> Router {
        let state = test_state();
        Router::new()
            .route("/me", get(whoami))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                require_authentication,
            ))
            .with_state(state)
    }

    fn admin_router(context: Option<AuthenticatedUser>) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .layer(middleware::from_fn(require_admin))
            .layer(middleware::from_fn(
                move |mut request: Request<Body>, next: Next| {
                    let context = context.clone();
                    async move {
                        if let Some(user) = context {
                            request.extensions_mut().insert(user);
                        }
                        next.run(request).await
                    }
                },
            ))
    }

    async fn status_of(router: Router, request: Request<Body>) -> StatusCode {
        router.oneshot(request).await.expect("response").status()
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let request = Request::get("/me").body(Body::empty()).expect("request");
        assert_eq!(status_of(gated_router(), request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_unauthorized() {
        let request = Request::get("/me")
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .expect("request");
        assert_eq!(status_of(gated_router(), request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let request = Request::get("/me")
            .header(AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .expect("request");
        assert_eq!(status_of(gated_router(), request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_gate_forbids_regular_user() {
        let request = Request::get("/admin").body(Body::empty()).expect("request");
        assert_eq!(
            status_of(admin_router(Some(user(false))), request).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_admin_gate_allows_admin() {
        let request = Request::get("/admin").body(Body::empty()).expect("request");
        assert_eq!(
            status_of(admin_router(Some(user(true))), request).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_admin_gate_without_context_is_unauthorized() {
        let request = Request::get("/admin").body(Body::empty()).expect("request");
        assert_eq!(
            status_of(admin_router(None), request).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_extractor_without_context_is_unauthorized() {
        let router: Router = Router::new().route("/me", get(whoami));
        let request = Request::get("/me").body(Body::empty()).expect("request");
        assert_eq!(status_of(router, request).await, StatusCode::UNAUTHORIZED);
    }
}
