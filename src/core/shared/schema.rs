// @generated shape kept in sync with migrations/2025-01-01-000000_create_academy

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        profile_image_url -> Nullable<Varchar>,
        is_admin -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    instructors (id) {
        id -> Int4,
        name -> Varchar,
        title -> Varchar,
        bio -> Nullable<Text>,
        profile_image_url -> Nullable<Varchar>,
        expertise -> Array<Text>,
        rating -> Numeric,
        student_count -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    courses (id) {
        id -> Int4,
        title -> Varchar,
        description -> Nullable<Text>,
        short_description -> Nullable<Text>,
        category -> Varchar,
        level -> Varchar,
        duration -> Nullable<Varchar>,
        price -> Numeric,
        image_url -> Nullable<Varchar>,
        instructor_id -> Nullable<Int4>,
        rating -> Numeric,
        student_count -> Int4,
        is_published -> Bool,
        start_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    lessons (id) {
        id -> Int4,
        course_id -> Int4,
        title -> Varchar,
        description -> Nullable<Text>,
        video_url -> Nullable<Varchar>,
        video_type -> Varchar,
        duration -> Nullable<Varchar>,
        lesson_order -> Int4,
        is_preview -> Bool,
        is_public -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    enrollments (id) {
        id -> Int4,
        user_id -> Uuid,
        course_id -> Int4,
        progress -> Numeric,
        completed_lessons -> Array<Int4>,
        last_accessed_lesson -> Nullable<Int4>,
        enrolled_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    lesson_progress (id) {
        id -> Int4,
        user_id -> Uuid,
        lesson_id -> Int4,
        course_id -> Int4,
        watched_seconds -> Int4,
        total_seconds -> Int4,
        is_completed -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    site_content (id) {
        id -> Int4,
        section -> Varchar,
        key -> Varchar,
        value -> Nullable<Text>,
        content_type -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(courses -> instructors (instructor_id));
diesel::joinable!(lessons -> courses (course_id));
diesel::joinable!(enrollments -> courses (course_id));
diesel::joinable!(enrollments -> users (user_id));
diesel::joinable!(lesson_progress -> lessons (lesson_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    instructors,
    courses,
    lessons,
    enrollments,
    lesson_progress,
    site_content,
);
