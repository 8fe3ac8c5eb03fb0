use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{ContentProgress, ReadingProgress};
use crate::db::types::ContentType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ContentProgressUpdate {
    #[serde(alias = "courseId")]
    pub(crate) course_id: i32,
    #[serde(alias = "contentType")]
    pub(crate) content_type: ContentType,
    #[serde(alias = "contentId")]
    #[validate(range(min = 1, message = "content_id must be positive"))]
    pub(crate) content_id: i32,
    #[serde(default = "default_true")]
    pub(crate) completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContentProgressResponse {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: i32,
    pub(crate) completed: bool,
    pub(crate) completed_at: Option<String>,
    pub(crate) updated_at: String,
}

impl ContentProgressResponse {
    pub(crate) fn from_db(row: ContentProgress) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            content_type: row.content_type,
            content_id: row.content_id,
            completed: row.completed,
            completed_at: row.completed_at.map(format_primitive),
            updated_at: format_primitive(row.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReadingProgressUpdate {
    #[serde(alias = "courseId")]
    pub(crate) course_id: i32,
    #[serde(default)]
    #[serde(alias = "chapterIndex")]
    #[validate(range(min = 0, message = "chapter_index must be non-negative"))]
    pub(crate) chapter_index: i32,
    #[serde(default)]
    #[serde(alias = "pageIndex")]
    #[validate(range(min = 0, message = "page_index must be non-negative"))]
    pub(crate) page_index: i32,
    #[serde(alias = "totalPages")]
    #[validate(range(min = 1, message = "total_pages must be greater than zero"))]
    pub(crate) total_pages: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReadingProgressResponse {
    pub(crate) course_id: i32,
    pub(crate) chapter_index: i32,
    pub(crate) page_index: i32,
    pub(crate) total_pages: i32,
    pub(crate) completion_percentage: f64,
    pub(crate) last_read_at: String,
}

impl ReadingProgressResponse {
    pub(crate) fn from_db(row: ReadingProgress) -> Self {
        Self {
            course_id: row.course_id,
            chapter_index: row.chapter_index,
            page_index: row.page_index,
            total_pages: row.total_pages,
            completion_percentage: row.completion_percentage,
            last_read_at: format_primitive(row.last_read_at),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_progress_defaults_to_completed() {
        let payload: ContentProgressUpdate = serde_json::from_value(json!({
            "courseId": 1,
            "contentType": "video",
            "contentId": 12
        }))
        .unwrap();
        assert!(payload.completed);
        assert_eq!(payload.content_type, ContentType::Video);
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let result = serde_json::from_value::<ContentProgressUpdate>(json!({
            "course_id": 1,
            "content_type": "podcast",
            "content_id": 2
        }));
        assert!(result.is_err());
    }

    #[test]
    fn zero_total_pages_fails_validation() {
        let payload: ReadingProgressUpdate = serde_json::from_value(json!({
            "course_id": 1,
            "chapter_index": 1,
            "page_index": 2,
            "total_pages": 0
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
