//! API Router
//!
//! Combines the module routers into one, grouped by who may call them:
//! visitors, signed-in users, and administrators.

use axum::{middleware, Router};
use std::sync::Arc;

use crate::core::middleware::{require_admin, require_authentication};
use crate::core::shared::state::AppState;

pub fn configure_api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .merge(crate::auth::configure_auth_routes())
        .merge(crate::catalog::configure_catalog_routes())
        .merge(crate::site_content::configure_site_content_routes())
        .merge(crate::contact::configure_contact_routes());

    let signed_in = Router::new()
        .merge(crate::auth::configure_profile_routes())
        .merge(crate::learn::configure_learn_routes())
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_authentication,
        ));

    // Layers run last-added first: authenticate, then check the admin flag.
    let admin = Router::new()
        .merge(crate::catalog::configure_catalog_admin_routes())
        .merge(crate::site_content::configure_site_content_admin_routes())
        .merge(crate::admin::configure_admin_routes())
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, require_authentication));

    public.merge(signed_in).merge(admin)
}

#[cfg(test)]
mod tests {
    use crate::core::shared::state::test_state;
    use crate::main_module::build_app;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn call(method: Method, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = build_app(test_state())
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_user_routes_require_token() {
        for (method, uri) in [
            (Method::GET, "/api/auth/user"),
            (Method::GET, "/api/enrollments"),
            (Method::POST, "/api/enrollments"),
            (Method::GET, "/api/enrollments/5"),
            (Method::PUT, "/api/lesson-progress"),
        ] {
            let (status, body) = call(method.clone(), uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["error"], "unauthorized");
        }
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        for (method, uri) in [
            (Method::GET, "/api/admin/stats"),
            (Method::GET, "/api/admin/courses"),
            (Method::DELETE, "/api/admin/courses/1"),
            (Method::GET, "/api/admin/lessons?courseId=1"),
            (Method::POST, "/api/admin/instructors"),
            (Method::PUT, "/api/admin/site-content"),
            (Method::GET, "/api/admin/students"),
            (
                Method::PUT,
                "/api/admin/students/7f1c1a52-8d1f-4c3e-9a55-2a3f0c6e9b10/promote",
            ),
        ] {
            let (status, _) = call(method.clone(), uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_signup_validation_reports_fields() {
        let (status, body) = call(
            Method::POST,
            "/api/auth/signup",
            Some(r#"{"email":"not-an-email","password":"123"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["fields"][0]["field"], "email");
        assert_eq!(body["fields"][1]["field"], "password");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = call(Method::POST, "/api/auth/login", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_contact_form_is_public() {
        let (status, body) = call(
            Method::POST,
            "/api/contact",
            Some(
                r#"{"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com","subject":"Hi","message":"Hello"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Message sent successfully");
    }

    #[tokio::test]
    async fn test_bad_path_parameter_is_json_400() {
        for uri in ["/api/courses/abc", "/api/courses/abc/lessons"] {
            let (status, body) = call(Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "bad_request");
            assert!(body["message"].as_str().is_some_and(|m| m.contains("abc")));
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = call(Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
