use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{
    Assignment, AssignmentSubmission, Course, CourseModule, CourseReading, CourseRequirements,
    CourseVideo,
};
use crate::db::types::{ContentType, ReadingSource};
use crate::repositories::courses::CourseWithStats;

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: i32,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_weeks: i32,
    pub(crate) instructor_id: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) category: Option<String>,
    pub(crate) difficulty: Option<String>,
    pub(crate) points: i32,
    pub(crate) created_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            duration_weeks: course.duration_weeks,
            instructor_id: course.instructor_id,
            is_active: course.is_active,
            category: course.category,
            difficulty: course.difficulty,
            points: course.points,
            created_at: format_primitive(course.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseWithStatsResponse {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) enrollment_count: i64,
    pub(crate) active_count: i64,
    pub(crate) completed_count: i64,
}

impl CourseWithStatsResponse {
    pub(crate) fn from_db(row: CourseWithStats) -> Self {
        Self {
            course: CourseResponse::from_db(row.course),
            enrollment_count: row.enrollment_count,
            active_count: row.active_count,
            completed_count: row.completed_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) week_number: Option<i32>,
    pub(crate) module_type: Option<ContentType>,
}

impl ModuleResponse {
    pub(crate) fn from_db(module: CourseModule) -> Self {
        Self {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            description: module.description,
            order_index: module.order_index,
            week_number: module.week_number,
            module_type: module.module_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseDetailResponse {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) modules: Vec<ModuleResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoResponse {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) video_url: String,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) order_index: i32,
    pub(crate) is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_name: Option<String>,
}

impl VideoResponse {
    pub(crate) fn from_db(video: CourseVideo) -> Self {
        Self {
            id: video.id,
            course_id: video.course_id,
            module_id: video.module_id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            duration_seconds: video.duration_seconds,
            order_index: video.order_index,
            is_published: video.is_published,
            course_name: None,
        }
    }

    pub(crate) fn with_course_name(mut self, course_name: String) -> Self {
        self.course_name = Some(course_name);
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReadingResponse {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) title: String,
    pub(crate) author: Option<String>,
    pub(crate) content_url: Option<String>,
    pub(crate) reading_type: String,
    pub(crate) order_index: i32,
    pub(crate) is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_name: Option<String>,
}

impl ReadingResponse {
    pub(crate) fn from_db(reading: CourseReading) -> Self {
        Self {
            id: reading.id,
            course_id: reading.course_id,
            title: reading.title,
            author: reading.author,
            content_url: reading.content_url,
            reading_type: reading.reading_type,
            order_index: reading.order_index,
            is_active: reading.is_active,
            course_name: None,
        }
    }

    pub(crate) fn with_course_name(mut self, course_name: String) -> Self {
        self.course_name = Some(course_name);
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) due_date: Option<String>,
    pub(crate) max_points: i32,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            course_id: assignment.course_id,
            module_id: assignment.module_id,
            title: assignment.title,
            description: assignment.description,
            due_date: assignment.due_date.map(format_primitive),
            max_points: assignment.max_points,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentSubmitRequest {
    #[validate(length(min = 1, message = "Submission content must not be empty"))]
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: i32,
    pub(crate) assignment_id: i32,
    pub(crate) student_id: String,
    pub(crate) content: String,
    pub(crate) submitted_at: String,
    pub(crate) grade: Option<i32>,
    pub(crate) feedback: Option<String>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: AssignmentSubmission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            content: submission.content,
            submitted_at: format_primitive(submission.submitted_at),
            grade: submission.grade,
            feedback: submission.feedback,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, max = 200, message = "Course name is required"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default = "default_duration_weeks")]
    #[serde(alias = "durationWeeks")]
    #[validate(range(min = 1, max = 104, message = "duration_weeks must be between 1 and 104"))]
    pub(crate) duration_weeks: i32,
    #[serde(default)]
    #[serde(alias = "instructorId")]
    pub(crate) instructor_id: Option<String>,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) difficulty: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "points must be non-negative"))]
    pub(crate) points: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
    #[serde(default)]
    #[serde(alias = "weekNumber")]
    pub(crate) week_number: Option<i32>,
    #[serde(default)]
    #[serde(alias = "moduleType")]
    pub(crate) module_type: Option<ContentType>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VideoCreate {
    #[serde(default)]
    #[serde(alias = "moduleId")]
    pub(crate) module_id: Option<i32>,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "videoUrl")]
    #[validate(url(message = "video_url must be a valid URL"))]
    pub(crate) video_url: String,
    #[serde(default)]
    #[serde(alias = "durationSeconds")]
    #[validate(range(min = 0, message = "duration_seconds must be non-negative"))]
    pub(crate) duration_seconds: Option<i32>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    pub(crate) order_index: i32,
    #[serde(default = "default_true")]
    #[serde(alias = "isPublished")]
    pub(crate) is_published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReadingCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) author: Option<String>,
    #[serde(default)]
    #[serde(alias = "contentUrl")]
    pub(crate) content_url: Option<String>,
    #[serde(default = "default_reading_type")]
    #[serde(alias = "readingType")]
    pub(crate) reading_type: String,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(default)]
    #[serde(alias = "moduleId")]
    pub(crate) module_id: Option<i32>,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    #[serde(alias = "dueDate")]
    pub(crate) due_date: Option<String>,
    #[serde(default = "default_max_points")]
    #[serde(alias = "maxPoints")]
    #[validate(range(min = 1, message = "max_points must be positive"))]
    pub(crate) max_points: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RequirementsUpdate {
    #[serde(alias = "requiredReadings")]
    #[validate(range(min = 0, message = "required_readings must be non-negative"))]
    pub(crate) required_readings: i32,
    #[serde(alias = "requiredQuizzes")]
    #[validate(range(min = 0, message = "required_quizzes must be non-negative"))]
    pub(crate) required_quizzes: i32,
    #[serde(alias = "requiredVideos")]
    #[validate(range(min = 0, message = "required_videos must be non-negative"))]
    pub(crate) required_videos: i32,
    #[serde(default = "default_completion_quizzes")]
    #[serde(alias = "completionQuizzes")]
    #[validate(range(min = 0, message = "completion_quizzes must be non-negative"))]
    pub(crate) completion_quizzes: i32,
    #[serde(default = "default_completion_essays")]
    #[serde(alias = "completionEssays")]
    #[validate(range(min = 0, message = "completion_essays must be non-negative"))]
    pub(crate) completion_essays: i32,
    #[serde(default = "default_reading_source")]
    #[serde(alias = "readingSource")]
    pub(crate) reading_source: ReadingSource,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequirementsResponse {
    pub(crate) course_id: i32,
    pub(crate) required_readings: i64,
    pub(crate) required_quizzes: i64,
    pub(crate) required_videos: i64,
    pub(crate) completion_quizzes: i64,
    pub(crate) completion_essays: i64,
    pub(crate) reading_source: ReadingSource,
    /// `false` when the values were derived from published content.
    pub(crate) configured: bool,
    pub(crate) updated_at: Option<String>,
}

impl RequirementsResponse {
    pub(crate) fn from_db(requirements: CourseRequirements) -> Self {
        Self {
            course_id: requirements.course_id,
            required_readings: i64::from(requirements.required_readings),
            required_quizzes: i64::from(requirements.required_quizzes),
            required_videos: i64::from(requirements.required_videos),
            completion_quizzes: i64::from(requirements.completion_quizzes),
            completion_essays: i64::from(requirements.completion_essays),
            reading_source: requirements.reading_source,
            configured: true,
            updated_at: Some(format_primitive(requirements.updated_at)),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_duration_weeks() -> i32 {
    12
}

fn default_reading_type() -> String {
    "article".to_string()
}

fn default_max_points() -> i32 {
    100
}

fn default_completion_quizzes() -> i32 {
    4
}

fn default_completion_essays() -> i32 {
    1
}

fn default_reading_source() -> ReadingSource {
    ReadingSource::Content
}
