use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Empty means any origin, without credentials.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<header::HeaderName>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn with_origins(mut self, origins: &[String]) -> Self {
        self.allowed_origins = origins
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    fn parsed_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {o}");
                    None
                }
            })
            .collect()
    }

    pub fn build(self) -> CorsLayer {
        let origins = self.parsed_origins();
        let cors = CorsLayer::new()
            .allow_methods(self.allowed_methods)
            .allow_headers(self.allowed_headers)
            .max_age(Duration::from_secs(self.max_age_secs));

        if origins.is_empty() {
            info!("CORS allows any origin");
            cors.allow_origin(Any)
        } else {
            info!("CORS configured with {} allowed origins", origins.len());
            cors.allow_origin(origins).allow_credentials(true)
        }
    }
}

pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    CorsConfig::default().with_origins(origins).build()
}
