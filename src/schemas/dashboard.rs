use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::repositories::instructor_permissions::PermissionView;
use crate::repositories::statistics::{PlatformTotals, StudentSummaryRow};
use crate::services::progress;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StudentSummary {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) gender: Option<String>,
    pub(crate) is_blocked: bool,
    pub(crate) created_at: String,
    pub(crate) enrolled_courses: i64,
    pub(crate) completed_courses: i64,
    pub(crate) quiz_attempts: i64,
    /// Percent, `None` without attempts.
    pub(crate) average_score: Option<f64>,
    pub(crate) gpa: f64,
}

impl StudentSummary {
    pub(crate) fn from_db(row: StudentSummaryRow) -> Self {
        let average_score = row.average_score.map(|score| progress::round2(score * 100.0));
        let full_name = format!("{} {}", row.first_name.trim(), row.last_name.trim())
            .trim()
            .to_string();
        Self {
            id: row.id,
            email: row.email,
            full_name: if full_name.is_empty() { row.username.clone() } else { full_name },
            username: row.username,
            gender: row.gender,
            is_blocked: row.is_blocked,
            created_at: format_primitive(row.created_at),
            enrolled_courses: row.enrolled_count,
            completed_courses: row.completed_count,
            quiz_attempts: row.attempt_count,
            average_score,
            gpa: average_score.map_or(0.0, progress::gpa_from_percent),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenderCount {
    pub(crate) gender: String,
    pub(crate) count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CoursePerformance {
    pub(crate) course_id: i32,
    pub(crate) course_name: String,
    pub(crate) is_active: bool,
    pub(crate) enrollments: i64,
    pub(crate) completed: i64,
    pub(crate) completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct MinistryOverview {
    pub(crate) total_students: i64,
    pub(crate) new_students_this_week: i64,
    pub(crate) total_courses: i64,
    pub(crate) average_gpa: f64,
    pub(crate) deans_list_count: usize,
    pub(crate) gender_distribution: Vec<GenderCount>,
    pub(crate) recent_students: Vec<StudentSummary>,
    pub(crate) top_students: Vec<StudentSummary>,
    pub(crate) course_performance: Vec<CoursePerformance>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminAnalytics {
    pub(crate) total_users: i64,
    pub(crate) total_students: i64,
    pub(crate) total_instructors: i64,
    pub(crate) total_courses: i64,
    pub(crate) active_courses: i64,
    pub(crate) total_enrollments: i64,
    pub(crate) active_enrollments: i64,
    pub(crate) completed_enrollments: i64,
    pub(crate) total_quiz_attempts: i64,
    pub(crate) certificates_issued: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) completion_rate: f64,
}

impl AdminAnalytics {
    pub(crate) fn from_db(totals: PlatformTotals) -> Self {
        Self {
            completion_rate: completion_rate(totals.completed_enrollments, totals.total_enrollments),
            total_users: totals.total_users,
            total_students: totals.total_students,
            total_instructors: totals.total_instructors,
            total_courses: totals.total_courses,
            active_courses: totals.active_courses,
            total_enrollments: totals.total_enrollments,
            active_enrollments: totals.active_enrollments,
            completed_enrollments: totals.completed_enrollments,
            total_quiz_attempts: totals.total_quiz_attempts,
            certificates_issued: totals.certificates_issued,
            average_score: totals.average_score.map(|score| progress::round2(score * 100.0)),
        }
    }
}

/// Percent of enrollments that completed, two decimals.
pub(crate) fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    progress::round2(completed as f64 / total as f64 * 100.0)
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PermissionGrant {
    #[serde(alias = "instructorId")]
    #[validate(length(min = 1, message = "instructor_id is required"))]
    pub(crate) instructor_id: String,
    #[serde(alias = "courseId")]
    pub(crate) course_id: i32,
    #[serde(default = "default_permissions")]
    #[validate(length(min = 1, message = "at least one permission is required"))]
    pub(crate) permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PermissionResponse {
    pub(crate) id: i32,
    pub(crate) instructor_id: String,
    pub(crate) course_id: i32,
    pub(crate) granted_by_id: Option<String>,
    pub(crate) permissions: Vec<String>,
    pub(crate) is_active: bool,
    pub(crate) granted_at: String,
    pub(crate) revoked_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) instructor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_name: Option<String>,
}

impl PermissionResponse {
    pub(crate) fn from_db(permission: crate::db::models::InstructorPermission) -> Self {
        Self {
            id: permission.id,
            instructor_id: permission.instructor_id,
            course_id: permission.course_id,
            granted_by_id: permission.granted_by_id,
            permissions: permission.permissions,
            is_active: permission.is_active,
            granted_at: format_primitive(permission.granted_at),
            revoked_at: permission.revoked_at.map(format_primitive),
            instructor_name: None,
            course_name: None,
        }
    }

    pub(crate) fn from_view(view: PermissionView) -> Self {
        let mut response = Self::from_db(view.permission);
        response.instructor_name = Some(view.instructor_name);
        response.course_name = Some(view.course_name);
        response
    }
}

fn default_permissions() -> Vec<String> {
    vec!["grade".to_string(), "view_students".to_string()]
}
