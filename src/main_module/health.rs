//! Health check handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::warn;

use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = match with_conn(&state.conn, |conn| {
        Ok(diesel::sql_query("SELECT 1").execute(conn)?)
    })
    .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!("Health check could not reach the database: {e}");
            false
        }
    };

    let status = if db_ok { "healthy" } else { "degraded" };
    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok
        })),
    )
}
