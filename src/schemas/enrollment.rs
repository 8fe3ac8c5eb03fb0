use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Certificate, Enrollment};
use crate::db::types::EnrollmentStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentCreate {
    #[serde(alias = "courseId")]
    pub(crate) course_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EnrollmentStatusUpdate {
    pub(crate) status: EnrollmentStatus,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 10.0, message = "grade must be between 0 and 10"))]
    pub(crate) grade: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: i32,
    pub(crate) student_id: String,
    pub(crate) course_id: i32,
    pub(crate) status: EnrollmentStatus,
    pub(crate) grade: Option<f64>,
    pub(crate) enrolled_at: String,
    pub(crate) completed_at: Option<String>,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            status: enrollment.status,
            grade: enrollment.grade,
            enrolled_at: format_primitive(enrollment.enrolled_at),
            completed_at: enrollment.completed_at.map(format_primitive),
        }
    }
}

/// Enrollment listed for its student, with course context and progress.
#[derive(Debug, Serialize)]
pub(crate) struct StudentEnrollmentResponse {
    #[serde(flatten)]
    pub(crate) enrollment: EnrollmentResponse,
    pub(crate) course_name: String,
    pub(crate) course_description: Option<String>,
    pub(crate) duration_weeks: i32,
    pub(crate) progress: i64,
    pub(crate) assignments_submitted: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentTransitionResponse {
    pub(crate) enrollment: EnrollmentResponse,
    pub(crate) certificate: Option<CertificateResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CertificateResponse {
    pub(crate) id: i32,
    pub(crate) certificate_number: String,
    pub(crate) student_id: String,
    pub(crate) course_id: i32,
    pub(crate) student_name: String,
    pub(crate) course_title: String,
    pub(crate) completion_date: String,
    pub(crate) final_grade: Option<f64>,
    pub(crate) instructor_name: Option<String>,
    pub(crate) certificate_type: String,
    pub(crate) issued_at: String,
}

impl CertificateResponse {
    pub(crate) fn from_db(certificate: Certificate) -> Self {
        Self {
            id: certificate.id,
            certificate_number: certificate.certificate_number,
            student_id: certificate.student_id,
            course_id: certificate.course_id,
            student_name: certificate.student_name,
            course_title: certificate.course_title,
            completion_date: format_primitive(certificate.completion_date),
            final_grade: certificate.final_grade,
            instructor_name: certificate.instructor_name,
            certificate_type: certificate.certificate_type,
            issued_at: format_primitive(certificate.issued_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CertificateVerification {
    pub(crate) valid: bool,
    pub(crate) certificate: Option<CertificateResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_update_parses_lowercase_status() {
        let payload: EnrollmentStatusUpdate =
            serde_json::from_value(json!({"status": "completed", "grade": 8.5})).unwrap();
        assert_eq!(payload.status, EnrollmentStatus::Completed);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn grade_above_scale_is_rejected() {
        let payload: EnrollmentStatusUpdate =
            serde_json::from_value(json!({"status": "completed", "grade": 85.0})).unwrap();
        assert!(payload.validate().is_err());
    }
}
