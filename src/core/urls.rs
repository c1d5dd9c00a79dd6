#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const HEALTH: &'static str = "/health";

    // Auth
    pub const AUTH_SIGNUP: &'static str = "/api/auth/signup";
    pub const AUTH_LOGIN: &'static str = "/api/auth/login";
    pub const AUTH_USER: &'static str = "/api/auth/user";

    // Public catalog
    pub const COURSES: &'static str = "/api/courses";
    pub const COURSE_BY_ID: &'static str = "/api/courses/:id";
    pub const COURSE_LESSONS: &'static str = "/api/courses/:id/lessons";
    pub const INSTRUCTORS: &'static str = "/api/instructors";
    pub const SITE_CONTENT: &'static str = "/api/site-content";

    // Learner
    pub const ENROLLMENTS: &'static str = "/api/enrollments";
    pub const ENROLLMENT_BY_COURSE: &'static str = "/api/enrollments/:course_id";
    pub const LESSON_PROGRESS: &'static str = "/api/lesson-progress";

    // Back-office
    pub const ADMIN_STATS: &'static str = "/api/admin/stats";
    pub const ADMIN_COURSES: &'static str = "/api/admin/courses";
    pub const ADMIN_COURSE_BY_ID: &'static str = "/api/admin/courses/:id";
    pub const ADMIN_LESSONS: &'static str = "/api/admin/lessons";
    pub const ADMIN_LESSON_BY_ID: &'static str = "/api/admin/lessons/:id";
    pub const ADMIN_INSTRUCTORS: &'static str = "/api/admin/instructors";
    pub const ADMIN_INSTRUCTOR_BY_ID: &'static str = "/api/admin/instructors/:id";
    pub const ADMIN_SITE_CONTENT: &'static str = "/api/admin/site-content";
    pub const ADMIN_STUDENTS: &'static str = "/api/admin/students";
    pub const ADMIN_STUDENT_BY_ID: &'static str = "/api/admin/students/:id";
    pub const ADMIN_STUDENT_PROMOTE: &'static str = "/api/admin/students/:id/promote";

    pub const CONTACT: &'static str = "/api/contact";
}
