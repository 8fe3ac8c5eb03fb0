//! Process-lifetime gamification state.
//!
//! Session points and the personal library live only in memory and are lost
//! on restart. Both maps are keyed by the presented auth token, or
//! [`GUEST_KEY`] for anonymous callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use time::PrimitiveDateTime;
use tokio::sync::RwLock;

pub(crate) const GUEST_KEY: &str = "guest";

const COMMENTARY_POINTS: u64 = 7;
const AI_TOOL_POINTS: u64 = 5;
const DEFAULT_POINTS: u64 = 1;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct LibraryItem {
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
    pub(crate) added_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NewLibraryItem {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) category: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) estimated_reading_time: Option<String>,
    pub(crate) cover_color: Option<String>,
    pub(crate) reading_status: Option<String>,
    pub(crate) pdf_url: Option<String>,
    pub(crate) cover_url: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum LibraryError {
    #[error("Book is already in your library")]
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct PointsAward {
    pub(crate) awarded: u64,
    pub(crate) total: u64,
}

#[derive(Default)]
pub(crate) struct SessionStore {
    points: RwLock<HashMap<String, u64>>,
    libraries: RwLock<HashMap<String, Vec<LibraryItem>>>,
    next_item_id: AtomicU64,
}

pub(crate) fn points_for_action(action: &str) -> u64 {
    match action {
        "ai_commentary" => COMMENTARY_POINTS,
        other if other.starts_with("ai_") => AI_TOOL_POINTS,
        _ => DEFAULT_POINTS,
    }
}

fn same_book(item: &LibraryItem, title: &str, author: &str) -> bool {
    item.title.trim().to_lowercase() == title.trim().to_lowercase()
        && item.author.trim().to_lowercase() == author.trim().to_lowercase()
}

impl SessionStore {
    pub(crate) async fn points(&self, key: &str) -> u64 {
        self.points.read().await.get(key).copied().unwrap_or(0)
    }

    pub(crate) async fn award(&self, key: &str, action: &str) -> PointsAward {
        let awarded = points_for_action(action);
        let mut points = self.points.write().await;
        let total = points.entry(key.to_string()).or_insert(0);
        *total = total.saturating_add(awarded);
        PointsAward {
            awarded,
            total: *total,
        }
    }

    pub(crate) async fn library(&self, key: &str) -> Vec<LibraryItem> {
        self.libraries.read().await.get(key).cloned().unwrap_or_default()
    }

    pub(crate) async fn add_to_library(
        &self,
        key: &str,
        item: NewLibraryItem,
        added_at: PrimitiveDateTime,
    ) -> Result<LibraryItem, LibraryError> {
        let mut libraries = self.libraries.write().await;
        let books = libraries.entry(key.to_string()).or_default();

        if books.iter().any(|book| same_book(book, &item.title, &item.author)) {
            return Err(LibraryError::Duplicate);
        }

        let stored = LibraryItem {
            id: self.next_item_id.fetch_add(1, Ordering::Relaxed) + 1,
            title: item.title.trim().to_string(),
            author: item.author.trim().to_string(),
            category: item.category,
            description: item.description,
            estimated_reading_time: item.estimated_reading_time,
            cover_color: item.cover_color,
            reading_status: item.reading_status.unwrap_or_else(|| "want_to_read".to_string()),
            pdf_url: item.pdf_url,
            cover_url: item.cover_url,
            added_at,
        };
        books.push(stored.clone());
        Ok(stored)
    }

    pub(crate) async fn remove_from_library(&self, key: &str, item_id: u64) -> bool {
        let mut libraries = self.libraries.write().await;
        let Some(books) = libraries.get_mut(key) else {
            return false;
        };
        let before = books.len();
        books.retain(|book| book.id != item_id);
        books.len() != before
    }
}
