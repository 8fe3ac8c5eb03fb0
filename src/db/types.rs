use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Instructor,
    Admin,
    Dean,
}

impl UserRole {
    /// Admins and deans see every dashboard and may manage any course.
    pub(crate) fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Dean)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
            UserRole::Dean => "dean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "enrollmentstatus", rename_all = "lowercase")]
pub(crate) enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    /// `active` is the only state with outgoing transitions.
    pub(crate) fn can_transition_to(self, next: EnrollmentStatus) -> bool {
        matches!(
            (self, next),
            (EnrollmentStatus::Active, EnrollmentStatus::Completed)
                | (EnrollmentStatus::Active, EnrollmentStatus::Dropped)
        )
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    YesNoWithText,
    Essay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "contenttype", rename_all = "lowercase")]
pub(crate) enum ContentType {
    Video,
    Reading,
    Quiz,
}

/// Where reading completion is counted from for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "readingsource", rename_all = "lowercase")]
pub(crate) enum ReadingSource {
    /// One `content_progress` row per finished reading.
    Content,
    /// A single paged book tracked in `reading_progress`.
    Book,
}
