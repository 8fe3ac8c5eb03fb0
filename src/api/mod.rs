pub(crate) mod admin;
pub(crate) mod announcements;
pub(crate) mod auth;
pub(crate) mod certificates;
pub(crate) mod courses;
pub(crate) mod dean;
pub(crate) mod enrollments;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod progress;
pub(crate) mod quizzes;
pub(crate) mod router;
pub(crate) mod session;
