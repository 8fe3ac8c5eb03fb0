use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Announcement;
use crate::services::session_store::{LibraryItem, NewLibraryItem};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LibraryItemCreate {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub(crate) title: String,
    #[validate(length(min = 1, max = 255, message = "author is required"))]
    pub(crate) author: String,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "estimatedReadingTime")]
    pub(crate) estimated_reading_time: Option<String>,
    #[serde(default)]
    #[serde(alias = "coverColor")]
    pub(crate) cover_color: Option<String>,
    #[serde(default)]
    #[serde(alias = "readingStatus")]
    pub(crate) reading_status: Option<String>,
    #[serde(default)]
    #[serde(alias = "pdfUrl")]
    pub(crate) pdf_url: Option<String>,
    #[serde(default)]
    #[serde(alias = "coverUrl")]
    pub(crate) cover_url: Option<String>,
}

/// Clients send either the item itself or `{ "bookData": { ... } }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LibraryAddRequest {
    Wrapped {
        #[serde(alias = "bookData")]
        book_data: LibraryItemCreate,
    },
    Plain(LibraryItemCreate),
}

impl LibraryAddRequest {
    pub(crate) fn into_item(self) -> LibraryItemCreate {
        match self {
            Self::Wrapped { book_data } => book_data,
            Self::Plain(item) => item,
        }
    }
}

impl From<LibraryItemCreate> for NewLibraryItem {
    fn from(item: LibraryItemCreate) -> Self {
        Self {
            title: item.title,
            author: item.author,
            category: item.category,
            description: item.description,
            estimated_reading_time: item.estimated_reading_time,
            cover_color: item.cover_color,
            reading_status: item.reading_status,
            pdf_url: item.pdf_url,
            cover_url: item.cover_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LibraryItemResponse {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) category: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) estimated_reading_time: Option<String>,
    pub(crate) cover_color: Option<String>,
    pub(crate) reading_status: String,
    pub(crate) pdf_url: Option<String>,
    pub(crate) cover_url: Option<String>,
    pub(crate) added_at: String,
}

impl LibraryItemResponse {
    pub(crate) fn from_item(item: LibraryItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            author: item.author,
            category: item.category,
            description: item.description,
            estimated_reading_time: item.estimated_reading_time,
            cover_color: item.cover_color,
            reading_status: item.reading_status,
            pdf_url: item.pdf_url,
            cover_url: item.cover_url,
            added_at: format_primitive(item.added_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LibraryResponse {
    pub(crate) books: Vec<LibraryItemResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointsAwardRequest {
    #[serde(default)]
    pub(crate) action: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PointsResponse {
    pub(crate) points: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PointsAwardResponse {
    pub(crate) success: bool,
    pub(crate) awarded: u64,
    pub(crate) total: u64,
    pub(crate) points: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnnouncementCreate {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub(crate) content: String,
    #[serde(default = "default_announcement_type")]
    #[serde(alias = "type", alias = "announcementType")]
    pub(crate) announcement_type: String,
    /// RFC 3339 timestamp; omitted means shown until deactivated.
    #[serde(default)]
    #[serde(alias = "showUntil")]
    pub(crate) show_until: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnnouncementResponse {
    pub(crate) id: i32,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) announcement_type: String,
    pub(crate) is_active: bool,
    pub(crate) show_until: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
}

impl AnnouncementResponse {
    pub(crate) fn from_db(announcement: Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title,
            content: announcement.content,
            announcement_type: announcement.announcement_type,
            is_active: announcement.is_active,
            show_until: announcement.show_until.map(format_primitive),
            created_by: announcement.created_by,
            created_at: format_primitive(announcement.created_at),
        }
    }
}

fn default_announcement_type() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn library_request_accepts_wrapped_and_plain_bodies() {
        let wrapped: LibraryAddRequest = serde_json::from_value(json!({
            "bookData": {"title": "Mere Christianity", "author": "C. S. Lewis"}
        }))
        .unwrap();
        let plain: LibraryAddRequest = serde_json::from_value(json!({
            "title": "Mere Christianity",
            "author": "C. S. Lewis",
            "readingStatus": "currently_reading"
        }))
        .unwrap();

        assert_eq!(wrapped.into_item().title, "Mere Christianity");
        let plain = plain.into_item();
        assert_eq!(plain.reading_status.as_deref(), Some("currently_reading"));
    }

    #[test]
    fn library_item_requires_author() {
        let item: LibraryItemCreate =
            serde_json::from_value(json!({"title": "Orthodoxy", "author": ""})).unwrap();
        assert!(item.validate().is_err());
    }

    #[test]
    fn announcement_accepts_type_alias() {
        let payload: AnnouncementCreate = serde_json::from_value(json!({
            "title": "Retreat",
            "content": "Spring retreat registration is open",
            "type": "event"
        }))
        .unwrap();
        assert_eq!(payload.announcement_type, "event");
        assert!(payload.show_until.is_none());
    }
}
