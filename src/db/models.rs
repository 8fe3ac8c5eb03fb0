use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{ContentType, EnrollmentStatus, QuestionType, ReadingSource, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) phone: Option<String>,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) bio: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) is_blocked: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AuthToken {
    pub(crate) id: i32,
    pub(crate) token_hash: String,
    pub(crate) user_id: String,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: i32,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_weeks: i32,
    pub(crate) instructor_id: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) category: Option<String>,
    pub(crate) difficulty: Option<String>,
    pub(crate) points: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseModule {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) week_number: Option<i32>,
    pub(crate) module_type: Option<ContentType>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseVideo {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) video_url: String,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) order_index: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseReading {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) title: String,
    pub(crate) author: Option<String>,
    pub(crate) content_url: Option<String>,
    pub(crate) reading_type: String,
    pub(crate) order_index: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseRequirements {
    pub(crate) course_id: i32,
    pub(crate) required_readings: i32,
    pub(crate) required_quizzes: i32,
    pub(crate) required_videos: i32,
    pub(crate) completion_quizzes: i32,
    pub(crate) completion_essays: i32,
    pub(crate) reading_source: ReadingSource,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: i32,
    pub(crate) student_id: String,
    pub(crate) course_id: i32,
    pub(crate) status: EnrollmentStatus,
    pub(crate) grade: Option<f64>,
    pub(crate) enrolled_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) slug: Option<String>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_final_exam: bool,
    pub(crate) is_published: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizQuestion {
    pub(crate) id: i32,
    pub(crate) quiz_id: i32,
    pub(crate) question: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Json<serde_json::Value>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: i32,
    pub(crate) student_id: String,
    pub(crate) quiz_id: i32,
    pub(crate) answers: Json<serde_json::Value>,
    /// Fraction in `[0, 1]`.
    pub(crate) score: f64,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) time_spent_seconds: Option<i32>,
    pub(crate) essay: Option<String>,
    pub(crate) essay_graded: bool,
    pub(crate) instructor_feedback: Option<String>,
    pub(crate) final_grade: Option<f64>,
    pub(crate) certificate_approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ContentProgress {
    pub(crate) id: i32,
    pub(crate) student_id: String,
    pub(crate) course_id: i32,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: i32,
    pub(crate) completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ReadingProgress {
    pub(crate) user_id: String,
    pub(crate) course_id: i32,
    pub(crate) chapter_index: i32,
    pub(crate) page_index: i32,
    pub(crate) total_pages: i32,
    pub(crate) completion_percentage: f64,
    pub(crate) last_read_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) max_points: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssignmentSubmission {
    pub(crate) id: i32,
    pub(crate) assignment_id: i32,
    pub(crate) student_id: String,
    pub(crate) content: String,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) grade: Option<i32>,
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Certificate {
    pub(crate) id: i32,
    pub(crate) certificate_number: String,
    pub(crate) student_id: String,
    pub(crate) course_id: i32,
    pub(crate) student_name: String,
    pub(crate) course_title: String,
    pub(crate) completion_date: PrimitiveDateTime,
    pub(crate) final_grade: Option<f64>,
    pub(crate) instructor_name: Option<String>,
    pub(crate) certificate_type: String,
    pub(crate) issued_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct InstructorPermission {
    pub(crate) id: i32,
    pub(crate) instructor_id: String,
    pub(crate) course_id: i32,
    pub(crate) granted_by_id: Option<String>,
    pub(crate) permissions: Vec<String>,
    pub(crate) is_active: bool,
    pub(crate) granted_at: PrimitiveDateTime,
    pub(crate) revoked_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Announcement {
    pub(crate) id: i32,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) announcement_type: String,
    pub(crate) is_active: bool,
    pub(crate) show_until: Option<PrimitiveDateTime>,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}
