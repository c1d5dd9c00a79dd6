//! # Learn Module - Enrollments and Progress
//!
//! - Enrolling in published courses (one enrollment per user and course)
//! - Per-lesson watch state
//! - Aggregate completion percentage folded into the enrollment

pub mod progress;
pub mod types;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::Utc;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Course;
use crate::core::error::{ApiError, ApiJson, ApiPath};
use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::schema::{courses, enrollments, lesson_progress, lessons};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{with_conn, DbPool};
use crate::core::urls::ApiUrls;

use self::progress::{
    completion_percentage, fold_completed_lesson, resolve_completed_at, retain_course_lessons,
};
pub use self::types::*;

// ============================================================================
// LEARN ENGINE
// ============================================================================

/// Re-derives every enrollment of a course from the course's current lessons.
/// Must run inside the caller's transaction; rows are locked while rewritten.
pub fn recompute_course_progress(conn: &mut PgConnection, course_id: i32) -> Result<usize, ApiError> {
    let course_lessons: Vec<i32> = lessons::table
        .filter(lessons::course_id.eq(course_id))
        .select(lessons::id)
        .load(conn)?;
    let rows: Vec<Enrollment> = enrollments::table
        .filter(enrollments::course_id.eq(course_id))
        .select(Enrollment::as_select())
        .for_update()
        .load(conn)?;

    let now = Utc::now();
    let mut updated = 0;
    for current in rows {
        let completed = retain_course_lessons(&current.completed_lessons, &course_lessons);
        let progress = completion_percentage(completed.len(), course_lessons.len());
        let completed_at = resolve_completed_at(current.completed_at, &progress, now);
        let last_accessed = current
            .last_accessed_lesson
            .filter(|id| course_lessons.contains(id));

        if completed == current.completed_lessons
            && progress == current.progress
            && completed_at == current.completed_at
            && last_accessed == current.last_accessed_lesson
        {
            continue;
        }

        diesel::update(enrollments::table.find(current.id))
            .set((
                enrollments::completed_lessons.eq(completed),
                enrollments::progress.eq(progress),
                enrollments::completed_at.eq(completed_at),
                enrollments::last_accessed_lesson.eq(last_accessed),
            ))
            .execute(conn)?;
        updated += 1;
    }
    Ok(updated)
}

pub struct LearnEngine {
    db: DbPool,
}

impl LearnEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Enrolls the user and bumps the course's student count in one
    /// transaction.
    pub async fn enroll(&self, user_id: Uuid, course_id: i32) -> Result<Enrollment, ApiError> {
        let enrollment = with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                let published: Option<i32> = courses::table
                    .find(course_id)
                    .filter(courses::is_published.eq(true))
                    .select(courses::id)
                    .for_update()
                    .first(conn)
                    .optional()?;
                if published.is_none() {
                    return Err(ApiError::not_found("Course"));
                }

                if find_enrollment(conn, user_id, course_id)?.is_some() {
                    return Err(ApiError::Conflict("Already enrolled in this course".into()));
                }

                let enrollment = diesel::insert_into(enrollments::table)
                    .values(&NewEnrollment { user_id, course_id })
                    .returning(Enrollment::as_returning())
                    .get_result(conn)?;

                diesel::update(courses::table.find(course_id))
                    .set(courses::student_count.eq(courses::student_count + 1))
                    .execute(conn)?;

                Ok(enrollment)
            })
        })
        .await?;

        info!("User {user_id} enrolled in course {course_id}");
        Ok(enrollment)
    }

    /// Newest first, each with its course.
    pub async fn list_enrollments(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EnrollmentWithCourse>, ApiError> {
        with_conn(&self.db, move |conn| {
            let rows = enrollments::table
                .inner_join(courses::table)
                .filter(enrollments::user_id.eq(user_id))
                .order((enrollments::enrolled_at.desc(), enrollments::id.desc()))
                .select((Enrollment::as_select(), Course::as_select()))
                .load::<(Enrollment, Course)>(conn)?;

            Ok(rows
                .into_iter()
                .map(|(enrollment, course)| EnrollmentWithCourse { enrollment, course })
                .collect())
        })
        .await
    }

    pub async fn get_enrollment(
        &self,
        user_id: Uuid,
        course_id: i32,
    ) -> Result<Option<Enrollment>, ApiError> {
        with_conn(&self.db, move |conn| Ok(find_enrollment(conn, user_id, course_id)?)).await
    }

    /// Upserts the watch state for (user, lesson). When the user is enrolled
    /// the enrollment row is locked, the last accessed lesson moves, and a
    /// completion is folded into the completed set and percentage.
    pub async fn record_lesson_progress(
        &self,
        user_id: Uuid,
        req: LessonProgressRequest,
    ) -> Result<LessonProgressResponse, ApiError> {
        with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                let lesson_course: i32 = lessons::table
                    .find(req.lesson_id)
                    .select(lessons::course_id)
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| ApiError::not_found("Lesson"))?;
                if lesson_course != req.course_id {
                    return Err(ApiError::BadRequest(
                        "Lesson does not belong to this course".into(),
                    ));
                }

                let lesson_id = req.lesson_id;
                let course_id = req.course_id;
                let is_completed = req.is_completed;
                let now = Utc::now();

                let lesson_progress = diesel::insert_into(lesson_progress::table)
                    .values(&req.into_new_progress(user_id))
                    .on_conflict((lesson_progress::user_id, lesson_progress::lesson_id))
                    .do_update()
                    .set((
                        lesson_progress::watched_seconds
                            .eq(excluded(lesson_progress::watched_seconds)),
                        lesson_progress::total_seconds.eq(excluded(lesson_progress::total_seconds)),
                        lesson_progress::is_completed.eq(lesson_progress::is_completed
                            .or(excluded(lesson_progress::is_completed))),
                        lesson_progress::updated_at.eq(now),
                    ))
                    .returning(LessonProgress::as_returning())
                    .get_result(conn)?;

                let Some(current) = enrollments::table
                    .filter(enrollments::user_id.eq(user_id))
                    .filter(enrollments::course_id.eq(course_id))
                    .select(Enrollment::as_select())
                    .for_update()
                    .first(conn)
                    .optional()?
                else {
                    return Ok(LessonProgressResponse {
                        lesson_progress,
                        enrollment: None,
                    });
                };

                let enrollment = if is_completed {
                    let course_lessons: Vec<i32> = lessons::table
                        .filter(lessons::course_id.eq(course_id))
                        .select(lessons::id)
                        .load(conn)?;

                    let completed =
                        fold_completed_lesson(&current.completed_lessons, lesson_id, &course_lessons);
                    let progress = completion_percentage(completed.len(), course_lessons.len());
                    let completed_at = resolve_completed_at(current.completed_at, &progress, now);

                    if current.completed_at.is_none() && completed_at.is_some() {
                        info!("User {user_id} completed course {course_id}");
                    }

                    diesel::update(enrollments::table.find(current.id))
                        .set((
                            enrollments::completed_lessons.eq(completed),
                            enrollments::progress.eq(progress),
                            enrollments::last_accessed_lesson.eq(Some(lesson_id)),
                            enrollments::completed_at.eq(completed_at),
                        ))
                        .returning(Enrollment::as_returning())
                        .get_result(conn)?
                } else {
                    diesel::update(enrollments::table.find(current.id))
                        .set(enrollments::last_accessed_lesson.eq(Some(lesson_id)))
                        .returning(Enrollment::as_returning())
                        .get_result(conn)?
                };

                Ok(LessonProgressResponse {
                    lesson_progress,
                    enrollment: Some(enrollment),
                })
            })
        })
        .await
    }
}

fn find_enrollment(
    conn: &mut PgConnection,
    user_id: Uuid,
    course_id: i32,
) -> QueryResult<Option<Enrollment>> {
    enrollments::table
        .filter(enrollments::user_id.eq(user_id))
        .filter(enrollments::course_id.eq(course_id))
        .select(Enrollment::as_select())
        .first(conn)
        .optional()
}

// ============================================================================
// HTTP HANDLERS
// ============================================================================

pub async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<EnrollmentWithCourse>>, ApiError> {
    let engine = LearnEngine::new(state.conn.clone());
    Ok(Json(engine.list_enrollments(user.id).await?))
}

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let engine = LearnEngine::new(state.conn.clone());
    let enrollment = engine.enroll(user.id, req.course_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn get_enrollment(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<Json<Enrollment>, ApiError> {
    let engine = LearnEngine::new(state.conn.clone());
    engine
        .get_enrollment(user.id, course_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Enrollment"))
}

pub async fn record_lesson_progress(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<LessonProgressRequest>,
) -> Result<Json<LessonProgressResponse>, ApiError> {
    req.validate()?;
    let engine = LearnEngine::new(state.conn.clone());
    Ok(Json(engine.record_lesson_progress(user.id, req).await?))
}

// ============================================================================
// ROUTE CONFIGURATION
// ============================================================================

/// Learner routes; mounted behind the authentication gate.
pub fn configure_learn_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::ENROLLMENTS, get(list_enrollments).post(enroll))
        .route(ApiUrls::ENROLLMENT_BY_COURSE, get(get_enrollment))
        .route(ApiUrls::LESSON_PROGRESS, put(record_lesson_progress))
}
