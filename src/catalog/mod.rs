//! # Catalog
//!
//! Courses, their ordered lessons and the instructors that teach them.
//! Visitors see published courses only; the back-office sees everything.

pub mod types;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::Utc;
use diesel::dsl::{exists, max};
use diesel::prelude::*;
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::core::shared::schema::{courses, enrollments, instructors, lesson_progress, lessons};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{with_conn, DbPool};
use crate::core::urls::ApiUrls;
use crate::learn::recompute_course_progress;

pub use types::*;

pub fn course_exists(conn: &mut PgConnection, course_id: i32) -> QueryResult<bool> {
    diesel::select(exists(courses::table.find(course_id))).get_result(conn)
}

pub fn count_lessons(conn: &mut PgConnection, course_id: i32) -> QueryResult<i64> {
    lessons::table
        .filter(lessons::course_id.eq(course_id))
        .count()
        .get_result(conn)
}

// ============================================================================
// CATALOG ENGINE
// ============================================================================

pub struct CatalogEngine {
    db: DbPool,
}

impl CatalogEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // ----- Course Operations -----

    pub async fn list_courses(
        &self,
        filters: CourseFilters,
        published_only: bool,
    ) -> Result<Vec<Course>, ApiError> {
        let filters = filters.normalized();
        with_conn(&self.db, move |conn| {
            let mut query = courses::table.select(Course::as_select()).into_boxed();

            if published_only {
                query = query.filter(courses::is_published.eq(true));
            }

            if let Some(category) = filters.category {
                query = query.filter(courses::category.eq(category));
            }

            if let Some(search) = filters.search {
                query = query.filter(courses::title.ilike(contains_pattern(&search)));
            }

            Ok(query
                .order((courses::created_at.desc(), courses::id.desc()))
                .load(conn)?)
        })
        .await
    }

    pub async fn get_course_with_instructor(
        &self,
        course_id: i32,
        published_only: bool,
    ) -> Result<Option<CourseWithInstructor>, ApiError> {
        with_conn(&self.db, move |conn| {
            let mut query = courses::table
                .left_join(instructors::table)
                .filter(courses::id.eq(course_id))
                .select((Course::as_select(), Option::<Instructor>::as_select()))
                .into_boxed();

            if published_only {
                query = query.filter(courses::is_published.eq(true));
            }

            let row = query
                .first::<(Course, Option<Instructor>)>(conn)
                .optional()?;
            Ok(row.map(|(course, instructor)| CourseWithInstructor { course, instructor }))
        })
        .await
    }

    pub async fn create_course(&self, req: CreateCourseRequest) -> Result<Course, ApiError> {
        let course = with_conn(&self.db, move |conn| {
            Ok(diesel::insert_into(courses::table)
                .values(&req)
                .returning(Course::as_returning())
                .get_result(conn)?)
        })
        .await?;

        info!("Course {} created: {}", course.id, course.title);
        Ok(course)
    }

    pub async fn update_course(
        &self,
        course_id: i32,
        req: UpdateCourseRequest,
    ) -> Result<Course, ApiError> {
        with_conn(&self.db, move |conn| {
            diesel::update(courses::table.find(course_id))
                .set((&req, courses::updated_at.eq(Utc::now())))
                .returning(Course::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Course"))
        })
        .await
    }

    /// Deletes the course with its lessons, enrollments and lesson progress.
    pub async fn delete_course(&self, course_id: i32) -> Result<(), ApiError> {
        with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                diesel::delete(
                    lesson_progress::table.filter(lesson_progress::course_id.eq(course_id)),
                )
                .execute(conn)?;
                diesel::delete(enrollments::table.filter(enrollments::course_id.eq(course_id)))
                    .execute(conn)?;
                diesel::delete(lessons::table.filter(lessons::course_id.eq(course_id)))
                    .execute(conn)?;

                let deleted = diesel::delete(courses::table.find(course_id)).execute(conn)?;
                if deleted == 0 {
                    return Err(ApiError::not_found("Course"));
                }
                Ok(())
            })
        })
        .await?;

        info!("Course {course_id} deleted");
        Ok(())
    }

    // ----- Lesson Operations -----

    /// Lessons in sequence. With `published_only` an unpublished or missing
    /// course is a 404 and locked videos are hidden.
    pub async fn get_lessons(
        &self,
        course_id: i32,
        published_only: bool,
    ) -> Result<Vec<Lesson>, ApiError> {
        with_conn(&self.db, move |conn| {
            if published_only {
                let visible: bool = diesel::select(exists(
                    courses::table
                        .find(course_id)
                        .filter(courses::is_published.eq(true)),
                ))
                .get_result(conn)?;
                if !visible {
                    return Err(ApiError::not_found("Course"));
                }
            }

            let rows = lessons::table
                .filter(lessons::course_id.eq(course_id))
                .order((lessons::lesson_order.asc(), lessons::id.asc()))
                .select(Lesson::as_select())
                .load(conn)?;

            Ok(if published_only {
                rows.into_iter().map(Lesson::public_view).collect()
            } else {
                rows
            })
        })
        .await
    }

    /// Without an explicit `order` the lesson goes after the current last one.
    /// Enrollments of the course are re-scored against the new lesson count.
    pub async fn create_lesson(&self, req: CreateLessonRequest) -> Result<Lesson, ApiError> {
        with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                if !course_exists(conn, req.course_id)? {
                    return Err(ApiError::not_found("Course"));
                }

                let lesson_order = match req.lesson_order {
                    Some(order) => order,
                    None => {
                        let current_max: Option<i32> = lessons::table
                            .filter(lessons::course_id.eq(req.course_id))
                            .select(max(lessons::lesson_order))
                            .first(conn)?;
                        current_max.map_or(1, |m| m + 1)
                    }
                };

                let lesson = diesel::insert_into(lessons::table)
                    .values(&req.into_new_lesson(lesson_order))
                    .returning(Lesson::as_returning())
                    .get_result(conn)?;
                recompute_course_progress(conn, lesson.course_id)?;
                Ok(lesson)
            })
        })
        .await
    }

    pub async fn update_lesson(
        &self,
        lesson_id: i32,
        req: UpdateLessonRequest,
    ) -> Result<Lesson, ApiError> {
        with_conn(&self.db, move |conn| {
            diesel::update(lessons::table.find(lesson_id))
                .set((&req, lessons::updated_at.eq(Utc::now())))
                .returning(Lesson::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Lesson"))
        })
        .await
    }

    /// Removes the lesson and its watch state, then re-scores the course's
    /// enrollments.
    pub async fn delete_lesson(&self, lesson_id: i32) -> Result<(), ApiError> {
        with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                diesel::delete(
                    lesson_progress::table.filter(lesson_progress::lesson_id.eq(lesson_id)),
                )
                .execute(conn)?;

                let Some(course_id) = diesel::delete(lessons::table.find(lesson_id))
                    .returning(lessons::course_id)
                    .get_result::<i32>(conn)
                    .optional()?
                else {
                    return Err(ApiError::not_found("Lesson"));
                };

                let updated = recompute_course_progress(conn, course_id)?;
                if updated > 0 {
                    info!("Recomputed {updated} enrollment(s) of course {course_id} after lesson removal");
                }
                Ok(())
            })
        })
        .await
    }

    // ----- Instructor Operations -----

    pub async fn list_instructors(&self) -> Result<Vec<Instructor>, ApiError> {
        with_conn(&self.db, |conn| {
            Ok(instructors::table
                .order((instructors::name.asc(), instructors::id.asc()))
                .select(Instructor::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_instructor(&self, instructor_id: i32) -> Result<Instructor, ApiError> {
        with_conn(&self.db, move |conn| {
            instructors::table
                .find(instructor_id)
                .select(Instructor::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Instructor"))
        })
        .await
    }

    pub async fn create_instructor(
        &self,
        req: CreateInstructorRequest,
    ) -> Result<Instructor, ApiError> {
        with_conn(&self.db, move |conn| {
            Ok(diesel::insert_into(instructors::table)
                .values(&req)
                .returning(Instructor::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_instructor(
        &self,
        instructor_id: i32,
        req: UpdateInstructorRequest,
    ) -> Result<Instructor, ApiError> {
        with_conn(&self.db, move |conn| {
            diesel::update(instructors::table.find(instructor_id))
                .set((&req, instructors::updated_at.eq(Utc::now())))
                .returning(Instructor::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Instructor"))
        })
        .await
    }

    /// Courses keep existing; their `instructor_id` is cleared by the schema.
    pub async fn delete_instructor(&self, instructor_id: i32) -> Result<(), ApiError> {
        with_conn(&self.db, move |conn| {
            let deleted = diesel::delete(instructors::table.find(instructor_id)).execute(conn)?;
            if deleted == 0 {
                return Err(ApiError::not_found("Instructor"));
            }
            Ok(())
        })
        .await
    }
}

// ============================================================================
// HTTP HANDLERS
// ============================================================================

fn engine(state: &AppState) -> CatalogEngine {
    CatalogEngine::new(state.conn.clone())
}

/// Published courses, newest first.
pub async fn list_published_courses(
    State(state): State<Arc<AppState>>,
    ApiQuery(filters): ApiQuery<CourseFilters>,
) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(engine(&state).list_courses(filters, true).await?))
}

pub async fn get_published_course(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<Json<CourseWithInstructor>, ApiError> {
    engine(&state)
        .get_course_with_instructor(course_id, true)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Course"))
}

pub async fn get_published_lessons(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    Ok(Json(engine(&state).get_lessons(course_id, true).await?))
}

pub async fn list_instructors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Instructor>>, ApiError> {
    Ok(Json(engine(&state).list_instructors().await?))
}

// ----- Back-office -----

pub async fn admin_list_courses(
    State(state): State<Arc<AppState>>,
    ApiQuery(filters): ApiQuery<CourseFilters>,
) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(engine(&state).list_courses(filters, false).await?))
}

pub async fn admin_get_course(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<Json<CourseWithInstructor>, ApiError> {
    engine(&state)
        .get_course_with_instructor(course_id, false)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Course"))
}

pub async fn admin_create_course(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    req.validate()?;
    let course = engine(&state).create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn admin_update_course(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    req.validate()?;
    Ok(Json(engine(&state).update_course(course_id, req).await?))
}

pub async fn admin_delete_course(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    engine(&state).delete_course(course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_list_lessons(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LessonQuery>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    let course_id = query
        .course_id
        .ok_or_else(|| ApiError::BadRequest("courseId query parameter is required".into()))?;
    Ok(Json(engine(&state).get_lessons(course_id, false).await?))
}

pub async fn admin_create_lesson(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateLessonRequest>,
) -> Result<(StatusCode, Json<Lesson>), ApiError> {
    req.validate()?;
    let lesson = engine(&state).create_lesson(req).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn admin_update_lesson(
    State(state): State<Arc<AppState>>,
    ApiPath(lesson_id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateLessonRequest>,
) -> Result<Json<Lesson>, ApiError> {
    req.validate()?;
    Ok(Json(engine(&state).update_lesson(lesson_id, req).await?))
}

pub async fn admin_delete_lesson(
    State(state): State<Arc<AppState>>,
    ApiPath(lesson_id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    engine(&state).delete_lesson(lesson_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_get_instructor(
    State(state): State<Arc<AppState>>,
    ApiPath(instructor_id): ApiPath<i32>,
) -> Result<Json<Instructor>, ApiError> {
    Ok(Json(engine(&state).get_instructor(instructor_id).await?))
}

pub async fn admin_create_instructor(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateInstructorRequest>,
) -> Result<(StatusCode, Json<Instructor>), ApiError> {
    req.validate()?;
    let instructor = engine(&state).create_instructor(req).await?;
    Ok((StatusCode::CREATED, Json(instructor)))
}

pub async fn admin_update_instructor(
    State(state): State<Arc<AppState>>,
    ApiPath(instructor_id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateInstructorRequest>,
) -> Result<Json<Instructor>, ApiError> {
    req.validate()?;
    Ok(Json(
        engine(&state)
            .update_instructor(instructor_id, req)
            .await?,
    ))
}

pub async fn admin_delete_instructor(
    State(state): State<Arc<AppState>>,
    ApiPath(instructor_id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    engine(&state).delete_instructor(instructor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTE CONFIGURATION
// ============================================================================

pub fn configure_catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::COURSES, get(list_published_courses))
        .route(ApiUrls::COURSE_BY_ID, get(get_published_course))
        .route(ApiUrls::COURSE_LESSONS, get(get_published_lessons))
        .route(ApiUrls::INSTRUCTORS, get(list_instructors))
}

pub fn configure_catalog_admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::ADMIN_COURSES,
            get(admin_list_courses).post(admin_create_course),
        )
        .route(
            ApiUrls::ADMIN_COURSE_BY_ID,
            get(admin_get_course)
                .put(admin_update_course)
                .delete(admin_delete_course),
        )
        .route(
            ApiUrls::ADMIN_LESSONS,
            get(admin_list_lessons).post(admin_create_lesson),
        )
        .route(
            ApiUrls::ADMIN_LESSON_BY_ID,
            put(admin_update_lesson).delete(admin_delete_lesson),
        )
        .route(
            ApiUrls::ADMIN_INSTRUCTORS,
            get(list_instructors).post(admin_create_instructor),
        )
        .route(
            ApiUrls::ADMIN_INSTRUCTOR_BY_ID,
            get(admin_get_instructor)
                .put(admin_update_instructor)
                .delete(admin_delete_instructor),
        )
}
