//! Back-office: dashboard figures and student management.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, put},
    Router,
};
use bigdecimal::{BigDecimal, RoundingMode};
use diesel::dsl::avg;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::users::{User, UserStore};
use crate::core::error::{ApiError, ApiPath};
use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::schema::{courses, enrollments, lessons, users};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{with_conn, DbPool};
use crate::core::urls::ApiUrls;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_students: i64,
    pub total_courses: i64,
    pub published_courses: i64,
    pub total_lessons: i64,
    pub total_enrollments: i64,
    /// Mean enrollment progress, 0 when nobody is enrolled.
    pub avg_completion_rate: BigDecimal,
}

pub async fn collect_stats(db: &DbPool) -> Result<AdminStats, ApiError> {
    with_conn(db, |conn| {
        let total_students = users::table.count().get_result(conn)?;
        let total_courses = courses::table.count().get_result(conn)?;
        let published_courses = courses::table
            .filter(courses::is_published.eq(true))
            .count()
            .get_result(conn)?;
        let total_lessons = lessons::table.count().get_result(conn)?;
        let total_enrollments = enrollments::table.count().get_result(conn)?;
        let average: Option<BigDecimal> = enrollments::table
            .select(avg(enrollments::progress))
            .first(conn)?;

        Ok(AdminStats {
            total_students,
            total_courses,
            published_courses,
            total_lessons,
            total_enrollments,
            avg_completion_rate: average
                .unwrap_or_default()
                .with_scale_round(2, RoundingMode::HalfUp),
        })
    })
    .await
}

// ============================================================================
// HTTP HANDLERS
// ============================================================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(collect_stats(&state.conn).await?))
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(UserStore::new(state.conn.clone()).list_users().await?))
}

pub async fn promote_student(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(
        UserStore::new(state.conn.clone())
            .promote_to_admin(user_id)
            .await?,
    ))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    admin: AuthenticatedUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("Administrators cannot delete their own account".into()));
    }
    UserStore::new(state.conn.clone()).delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::ADMIN_STATS, get(get_stats))
        .route(ApiUrls::ADMIN_STUDENTS, get(list_students))
        .route(ApiUrls::ADMIN_STUDENT_BY_ID, delete(delete_student))
        .route(ApiUrls::ADMIN_STUDENT_PROMOTE, put(promote_student))
}
