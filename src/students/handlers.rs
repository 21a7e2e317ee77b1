use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    FeedbackRequest, HistoryEntry, StudentListResponse, StudentProfile, StudentProfileResponse,
    StudentResponse, UpsertStudentRequest,
};
use super::repo_types::Student;
use crate::error::ApiError;
use crate::meals::dto::MessageResponse;
use crate::meals::repo_types::Meal;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", post(upsert_student).get(list_students))
        .route("/students/:email", get(get_student).delete(delete_student))
        .route("/students/:email/feedback", post(record_feedback))
}

#[instrument(skip(state, body))]
pub async fn upsert_student(
    State(state): State<AppState>,
    Json(body): Json<UpsertStudentRequest>,
) -> Result<Json<StudentResponse>, ApiError> {
    let violations = body.validate();
    if !violations.is_empty() {
        warn!(?violations, "profile write rejected");
        return Err(ApiError::Validation(violations));
    }
    let email = body.email.as_deref().unwrap_or_default().trim().to_string();
    let name = body.name.as_deref().unwrap_or_default().trim().to_string();

    let student = Student::upsert_by_email(&state.db, &email, &name, &body).await?;
    info!(student_id = %student.id, email = %student.email, "profile saved");
    Ok(Json(StudentResponse {
        success: true,
        message: Some("Student profile updated successfully".into()),
        student,
    }))
}

/// Profile read with history resolved to meal documents. A history entry
/// whose meal id no longer resolves comes back with `meal: null` instead
/// of failing the read.
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<StudentProfileResponse>, ApiError> {
    let student = Student::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;

    let history = Student::history_for(&state.db, student.id).await?;
    let ids: Vec<Uuid> = history.iter().map(|h| h.meal_id).collect();
    let mut resolved: HashMap<Uuid, Meal> = Meal::by_ids(&state.db, &ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let meal_history = history
        .into_iter()
        .map(|h| HistoryEntry {
            meal: resolved.remove(&h.meal_id),
            meal_id: h.meal_id,
            liked: h.liked,
            consumed_at: h.consumed_at,
        })
        .collect();

    Ok(Json(StudentProfileResponse {
        success: true,
        student: StudentProfile {
            student,
            meal_history,
        },
    }))
}

#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<StudentListResponse>, ApiError> {
    let students = Student::list_all(&state.db).await?;
    Ok(Json(StudentListResponse {
        success: true,
        count: students.len(),
        students,
    }))
}

#[instrument(skip(state, body))]
pub async fn record_feedback(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (meal_id, liked) = body.validate().map_err(ApiError::Validation)?;

    let student = Student::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;

    Student::record_feedback(&state.db, student.id, meal_id, liked).await?;
    info!(student_id = %student.id, %meal_id, liked, "feedback recorded");
    Ok(Json(MessageResponse {
        success: true,
        message: "Feedback recorded successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Student::delete_by_email(&state.db, &email).await? {
        return Err(ApiError::NotFound("Student"));
    }
    info!(email = %email, "profile deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Student profile deleted successfully".into(),
    }))
}
