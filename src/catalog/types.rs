//! Types for the catalog: courses, lessons and instructors.
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::ApiError;
use crate::core::shared::schema::{courses, instructors, lessons};
use crate::security::validation::ValidationResult;

pub const COURSE_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];
pub const VIDEO_TYPES: &[&str] = &["upload", "youtube"];

/// Keeps an explicit `null` apart from an absent key in partial updates:
/// absent is `None` (column untouched), `null` is `Some(None)` (SET NULL).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// DATA MODELS
// ============================================================================

// ----- Instructor Models -----

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = instructors)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: i32,
    pub name: String,
    pub title: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub expertise: Vec<String>,
    pub rating: BigDecimal,
    pub student_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Insertable)]
#[diesel(table_name = instructors)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstructorRequest {
    pub name: String,
    pub title: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub rating: Option<BigDecimal>,
    pub student_count: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = instructors)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstructorRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub profile_image_url: Option<Option<String>>,
    pub expertise: Option<Vec<String>>,
    pub rating: Option<BigDecimal>,
    pub student_count: Option<i32>,
}

// ----- Course Models -----

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = courses)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: String,
    pub level: String,
    pub duration: Option<String>,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub instructor_id: Option<i32>,
    pub rating: BigDecimal,
    pub student_count: i32,
    pub is_published: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithInstructor {
    #[serde(flatten)]
    pub course: Course,
    pub instructor: Option<Instructor>,
}

#[derive(Debug, Clone, Deserialize, Insertable)]
#[diesel(table_name = courses)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: String,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub price: Option<BigDecimal>,
    pub image_url: Option<String>,
    pub instructor_id: Option<i32>,
    pub rating: Option<BigDecimal>,
    pub is_published: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = courses)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub short_description: Option<Option<String>>,
    pub category: Option<String>,
    pub level: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: Option<Option<String>>,
    pub price: Option<BigDecimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub instructor_id: Option<Option<i32>>,
    pub rating: Option<BigDecimal>,
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<DateTime<Utc>>>,
}

/// Query-string filters shared by the public and back-office listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilters {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl CourseFilters {
    /// Blank values and the `all` category mean "no filter".
    pub fn normalized(self) -> Self {
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { category, search }
    }
}

/// `%term%` for ILIKE with the LIKE wildcards in `term` escaped.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

// ----- Lesson Models -----

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = lessons)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub video_type: String,
    pub duration: Option<String>,
    #[serde(rename = "order")]
    pub lesson_order: i32,
    pub is_preview: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    /// Catalog view for visitors: the video is only exposed on preview or
    /// public lessons.
    pub fn public_view(mut self) -> Self {
        if !(self.is_preview || self.is_public) {
            self.video_url = None;
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub video_type: Option<String>,
    pub duration: Option<String>,
    #[serde(rename = "order")]
    pub lesson_order: Option<i32>,
    pub is_preview: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lessons)]
pub struct NewLesson {
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub video_type: Option<String>,
    pub duration: Option<String>,
    pub lesson_order: i32,
    pub is_preview: Option<bool>,
    pub is_public: Option<bool>,
}

impl CreateLessonRequest {
    pub fn into_new_lesson(self, lesson_order: i32) -> NewLesson {
        NewLesson {
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            video_url: self.video_url,
            video_type: self.video_type,
            duration: self.duration,
            lesson_order,
            is_preview: self.is_preview,
            is_public: self.is_public,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = lessons)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub video_url: Option<Option<String>>,
    pub video_type: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: Option<Option<String>>,
    #[serde(rename = "order")]
    pub lesson_order: Option<i32>,
    pub is_preview: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonQuery {
    pub course_id: Option<i32>,
}

// ============================================================================
// VALIDATION
// ============================================================================

impl CreateInstructorRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.required("name", &self.name)
            .required("title", &self.title)
            .decimal_range("rating", self.rating.as_ref(), 0, Some(5))
            .non_negative("studentCount", self.student_count);
        v.into_result()
    }
}

impl UpdateInstructorRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.not_blank("name", self.name.as_deref())
            .not_blank("title", self.title.as_deref())
            .decimal_range("rating", self.rating.as_ref(), 0, Some(5))
            .non_negative("studentCount", self.student_count);
        v.into_result()
    }
}

impl CreateCourseRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.required("title", &self.title)
            .required("category", &self.category)
            .one_of("level", self.level.as_deref(), COURSE_LEVELS)
            .decimal_range("price", self.price.as_ref(), 0, None)
            .decimal_range("rating", self.rating.as_ref(), 0, Some(5));
        v.into_result()
    }
}

impl UpdateCourseRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.not_blank("title", self.title.as_deref())
            .not_blank("category", self.category.as_deref())
            .one_of("level", self.level.as_deref(), COURSE_LEVELS)
            .decimal_range("price", self.price.as_ref(), 0, None)
            .decimal_range("rating", self.rating.as_ref(), 0, Some(5));
        v.into_result()
    }
}

impl CreateLessonRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.required("title", &self.title)
            .non_negative("order", self.lesson_order)
            .one_of("videoType", self.video_type.as_deref(), VIDEO_TYPES);
        v.into_result()
    }
}

impl UpdateLessonRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = ValidationResult::new();
        v.not_blank("title", self.title.as_deref())
            .non_negative("order", self.lesson_order)
            .one_of("videoType", self.video_type.as_deref(), VIDEO_TYPES);
        v.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_filters_treat_all_and_blank_as_absent() {
        let filters = CourseFilters {
            category: Some("All".into()),
            search: Some("   ".into()),
        }
        .normalized();
        assert!(filters.category.is_none());
        assert!(filters.search.is_none());

        let filters = CourseFilters {
            category: Some(" design ".into()),
            search: Some(" Rust ".into()),
        }
        .normalized();
        assert_eq!(filters.category.as_deref(), Some("design"));
        assert_eq!(filters.search.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rust"), "%rust%");
        assert_eq!(contains_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[test]
    fn test_course_request_validation() {
        let request: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "",
            "category": "dev",
            "level": "expert",
            "price": "-1",
            "rating": 6
        }))
        .expect("deserialize");

        match request.validate() {
            Err(ApiError::Validation(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["title", "level", "price", "rating"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_course_update_keeps_null_apart_from_absent() {
        let request: UpdateCourseRequest = serde_json::from_value(serde_json::json!({
            "instructorId": null,
            "imageUrl": "https://img.example.com/rust.png"
        }))
        .expect("deserialize");

        assert_eq!(request.instructor_id, Some(None));
        assert_eq!(
            request.image_url,
            Some(Some("https://img.example.com/rust.png".to_string()))
        );
        assert_eq!(request.description, None);
        assert_eq!(request.start_date, None);
        assert!(request.validate().is_ok());

        let request: UpdateLessonRequest =
            serde_json::from_value(serde_json::json!({ "videoUrl": null, "title": "Intro" }))
                .expect("deserialize");
        assert_eq!(request.video_url, Some(None));
        assert_eq!(request.description, None);

        let request: UpdateInstructorRequest =
            serde_json::from_value(serde_json::json!({ "bio": null })).expect("deserialize");
        assert_eq!(request.bio, Some(None));
        assert_eq!(request.profile_image_url, None);
    }

    #[test]
    fn test_lesson_order_uses_order_key() {
        let request: CreateLessonRequest = serde_json::from_value(serde_json::json!({
            "courseId": 5,
            "title": "Intro",
            "order": 3,
            "videoType": "youtube"
        }))
        .expect("deserialize");
        assert_eq!(request.lesson_order, Some(3));
        assert!(request.validate().is_ok());

        let lesson = request.into_new_lesson(3);
        assert_eq!(lesson.lesson_order, 3);
        assert_eq!(lesson.course_id, 5);
    }

    #[test]
    fn test_lesson_rejects_negative_order_and_unknown_video_type() {
        let request = UpdateLessonRequest {
            lesson_order: Some(-1),
            video_type: Some("vimeo".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation(fields)) if fields.len() == 2
        ));
    }

    #[test]
    fn test_public_view_hides_locked_video() {
        let now = Utc::now();
        let lesson = Lesson {
            id: 1,
            course_id: 5,
            title: "Locked".into(),
            description: None,
            video_url: Some("https://videos.example.com/1".into()),
            video_type: "upload".into(),
            duration: None,
            lesson_order: 1,
            is_preview: false,
            is_public: false,
            created_at: now,
            updated_at: now,
        };

        let preview = Lesson {
            is_preview: true,
            ..lesson.clone()
        };

        assert!(lesson.public_view().video_url.is_none());
        assert!(preview.public_view().video_url.is_some());
    }

    #[test]
    fn test_course_serializes_camel_case_with_instructor() {
        let now = Utc::now();
        let course = Course {
            id: 5,
            title: "Rust".into(),
            description: None,
            short_description: Some("Systems".into()),
            category: "dev".into(),
            level: "beginner".into(),
            duration: None,
            price: BigDecimal::from_str("49.99").expect("decimal"),
            image_url: None,
            instructor_id: None,
            rating: BigDecimal::from(0),
            student_count: 0,
            is_published: true,
            start_date: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(CourseWithInstructor {
            course,
            instructor: None,
        })
        .expect("serialize");

        assert_eq!(json["shortDescription"], "Systems");
        assert_eq!(json["isPublished"], true);
        assert!(json["instructor"].is_null());
        assert_eq!(json["id"], 5);
    }
}
