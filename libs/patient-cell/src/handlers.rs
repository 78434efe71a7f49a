use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::form::MultipartForm;

use crate::forms::{patient_update_from_form, profile_update_from_form};
use crate::services::PatientService;

// ==============================================================================
// ADMIN PANEL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn all_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(&config).list_patients().await?;

    Ok(Json(json!({
        "success": true,
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&config).get_patient(&patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut form = MultipartForm::from_multipart(multipart).await?;
    let update = patient_update_from_form(&form)?;

    debug!("Admin {:?} updating patient {}", user.email, patient_id);
    let patient = PatientService::new(&config)
        .update_patient(&patient_id, update, form.take_image())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient updated successfully",
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    PatientService::new(&config).delete_patient(&patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient deleted successfully"
    })))
}

// ==============================================================================
// PATIENT PORTAL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&config).get_patient(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "user_data": patient
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut form = MultipartForm::from_multipart(multipart).await?;
    let profile = profile_update_from_form(&form)?;

    let patient = PatientService::new(&config)
        .update_profile(&user.id, profile, form.take_image())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile Updated",
        "user_data": patient
    })))
}
