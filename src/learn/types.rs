//! Types for enrollments and per-lesson watch state.
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Course;
use crate::core::error::ApiError;
use crate::core::shared::schema::{enrollments, lesson_progress};
use crate::security::validation::ValidationResult;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = enrollments)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i32,
    pub user_id: Uuid,
    pub course_id: i32,
    pub progress: BigDecimal,
    pub completed_lessons: Vec<i32>,
    pub last_accessed_lesson: Option<i32>,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentWithCourse {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course: Course,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = enrollments)]
pub struct NewEnrollment {
    pub user_id: Uuid,
    pub course_id: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = lesson_progress)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub id: i32,
    pub user_id: Uuid,
    pub lesson_id: i32,
    pub course_id: i32,
    pub watched_seconds: i32,
    pub total_seconds: i32,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lesson_progress)]
pub struct NewLessonProgress {
    pub user_id: Uuid,
    pub lesson_id: i32,
    pub course_id: i32,
    pub watched_seconds: i32,
    pub total_seconds: i32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressRequest {
    pub lesson_id: i32,
    pub course_id: i32,
    #[serde(default)]
    pub watched_seconds: i32,
    #[serde(default)]
    pub total_seconds: i32,
    #[serde(default)]
    pub is_completed: bool,
}

impl LessonProgressRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.non_negative("watchedSeconds", Some(self.watched_seconds))
            .non_negative("totalSeconds", Some(self.total_seconds));
        v.into_result()
    }

    pub fn into_new_progress(self, user_id: Uuid) -> NewLessonProgress {
        NewLessonProgress {
            user_id,
            lesson_id: self.lesson_id,
            course_id: self.course_id,
            watched_seconds: self.watched_seconds,
            total_seconds: self.total_seconds,
            is_completed: self.is_completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressResponse {
    pub lesson_progress: LessonProgress,
    /// Present when the caller is enrolled in the lesson's course.
    pub enrollment: Option<Enrollment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_request_defaults() {
        let request: LessonProgressRequest =
            serde_json::from_value(serde_json::json!({ "lessonId": 3, "courseId": 5 }))
                .expect("deserialize");
        assert_eq!(request.watched_seconds, 0);
        assert!(!request.is_completed);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_negative_seconds_rejected() {
        let request: LessonProgressRequest = serde_json::from_value(serde_json::json!({
            "lessonId": 3,
            "courseId": 5,
            "watchedSeconds": -5,
            "totalSeconds": 60,
            "isCompleted": true
        }))
        .expect("deserialize");
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation(fields)) if fields[0].field == "watchedSeconds"
        ));
    }
}
