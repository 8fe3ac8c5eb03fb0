pub(crate) mod announcements;
pub(crate) mod assignments;
pub(crate) mod auth_tokens;
pub(crate) mod certificates;
pub(crate) mod content_progress;
pub(crate) mod course_modules;
pub(crate) mod course_readings;
pub(crate) mod course_requirements;
pub(crate) mod course_videos;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod instructor_permissions;
pub(crate) mod quiz_attempts;
pub(crate) mod quizzes;
pub(crate) mod reading_progress;
pub(crate) mod statistics;
pub(crate) mod users;
