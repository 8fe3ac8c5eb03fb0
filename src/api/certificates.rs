use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::enrollment::{CertificateResponse, CertificateVerification};
use crate::services::certificates::looks_like_certificate_number;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_certificates))
        .route("/verify/:certificate_number", get(verify_certificate))
}

async fn list_certificates(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CertificateResponse>>, ApiError> {
    let certificates = repositories::certificates::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificates"))?;

    Ok(Json(certificates.into_iter().map(CertificateResponse::from_db).collect()))
}

/// Public. Malformed numbers are answered without touching the database.
async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_number): Path<String>,
) -> Result<Json<CertificateVerification>, ApiError> {
    let certificate_number = certificate_number.trim().to_uppercase();
    if !looks_like_certificate_number(&certificate_number) {
        return Ok(Json(CertificateVerification { valid: false, certificate: None }));
    }

    let certificate = repositories::certificates::find_by_number(state.db(), &certificate_number)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to verify certificate"))?;

    Ok(Json(CertificateVerification {
        valid: certificate.is_some(),
        certificate: certificate.map(CertificateResponse::from_db),
    }))
}
