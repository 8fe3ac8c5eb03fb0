use rand::Rng;
use sqlx::PgConnection;
use time::PrimitiveDateTime;

use crate::core::time::{compact_date, primitive_now_utc};
use crate::db::models::Certificate;
use crate::repositories::{certificates, courses, users};

const PREFIX: &str = "SFGM";
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 8;

pub(crate) fn generate_certificate_number(issued_at: PrimitiveDateTime) -> String {
    format!("{}-{}-{}", PREFIX, compact_date(issued_at), generate_suffix(SUFFIX_LEN))
}

/// Cheap shape check so verification can reject garbage without a query.
pub(crate) fn looks_like_certificate_number(value: &str) -> bool {
    let mut parts = value.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == PREFIX
        && date.len() == 8
        && date.bytes().all(|byte| byte.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|byte| ALPHABET.contains(&byte))
}

fn generate_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(len);
    for _ in 0..len {
        let index = rng.gen_range(0..ALPHABET.len());
        output.push(ALPHABET[index] as char);
    }
    output
}

/// Records the course completion and issues the certificate, both at most
/// once per (student, course). Meant to run inside the transaction that
/// moved the enrollment to `completed`.
pub(crate) async fn record_completion(
    conn: &mut PgConnection,
    student_id: &str,
    course_id: i32,
    completed_at: PrimitiveDateTime,
    final_grade: Option<f64>,
) -> Result<Option<Certificate>, sqlx::Error> {
    certificates::record_course_completion(
        &mut *conn,
        student_id,
        course_id,
        completed_at,
        final_grade,
    )
    .await?;

    let Some(student) = users::find_by_id(&mut *conn, student_id).await? else {
        return Ok(None);
    };
    let Some(course) = courses::find_by_id(&mut *conn, course_id).await? else {
        return Ok(None);
    };

    let instructor_name = match course.instructor_id.as_deref() {
        Some(instructor_id) => users::find_by_id(&mut *conn, instructor_id)
            .await?
            .map(|instructor| instructor.full_name()),
        None => None,
    };

    let issued_at = primitive_now_utc();
    let certificate_number = generate_certificate_number(issued_at);
    let student_name = student.full_name();

    let certificate = certificates::issue_if_absent(
        &mut *conn,
        certificates::IssueCertificate {
            certificate_number: &certificate_number,
            student_id,
            course_id,
            student_name: &student_name,
            course_title: &course.name,
            completion_date: completed_at,
            final_grade,
            instructor_name: instructor_name.as_deref(),
            issued_at,
        },
    )
    .await?;

    if let Some(certificate) = &certificate {
        tracing::info!(
            user_id = %student_id,
            course_id,
            certificate_number = %certificate.certificate_number,
            action = "certificate_issued",
            "Certificate issued"
        );
    }

    Ok(certificate)
}
