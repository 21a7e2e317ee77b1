use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    BulkImportRequest, BulkImportResponse, CreateMealRequest, MealListQuery, MealListResponse,
    MealResponse, MessageResponse, RateMealRequest, RateMealResponse, RecommendQuery,
    RecommendResponse, UpdateMealRequest,
};
use super::repo::MealFilter;
use super::repo_types::Meal;
use super::{recommend, services};
use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/bulk-import", post(bulk_import))
        .route("/meals/recommend/:email", get(recommend_meals))
        .route(
            "/meals/:id",
            get(get_meal).put(update_meal).delete(deactivate_meal),
        )
        .route("/meals/:id/rate", post(rate_meal))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(query): Query<MealListQuery>,
) -> Result<Json<MealListResponse>, ApiError> {
    let filter = MealFilter {
        cuisine: query.cuisine,
        category: query.category,
        dietary_preference: query.dietary_preference,
        min_calories: query.min_calories,
        max_calories: query.max_calories,
        min_protein: query.min_protein,
        ..MealFilter::default()
    };
    let meals = Meal::list(&state.db, &filter).await?;
    Ok(Json(MealListResponse {
        success: true,
        count: meals.len(),
        meals,
    }))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealResponse>, ApiError> {
    let meal = Meal::get_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Meal"))?;
    Ok(Json(MealResponse {
        success: true,
        message: None,
        meal,
    }))
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Json(body): Json<CreateMealRequest>,
) -> Result<Json<MealResponse>, ApiError> {
    let violations = body.validate();
    if !violations.is_empty() {
        warn!(?violations, "meal create rejected");
        return Err(ApiError::Validation(violations));
    }
    let meal = Meal::create(&state.db, &body).await?;
    info!(meal_id = %meal.id, meal_name = %meal.meal_name, "meal created");
    Ok(Json(MealResponse {
        success: true,
        message: Some("Meal created successfully".into()),
        meal,
    }))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealRequest>,
) -> Result<Json<MealResponse>, ApiError> {
    let violations = body.validate();
    if !violations.is_empty() {
        warn!(%id, ?violations, "meal update rejected");
        return Err(ApiError::Validation(violations));
    }
    let meal = Meal::update(&state.db, id, &body)
        .await?
        .ok_or(ApiError::NotFound("Meal"))?;
    info!(meal_id = %id, "meal updated");
    Ok(Json(MealResponse {
        success: true,
        message: Some("Meal updated successfully".into()),
        meal,
    }))
}

#[instrument(skip(state))]
pub async fn deactivate_meal(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Meal::deactivate(&state.db, id).await? {
        return Err(ApiError::NotFound("Meal"));
    }
    info!(meal_id = %id, "meal deactivated");
    Ok(Json(MessageResponse {
        success: true,
        message: "Meal deactivated successfully".into(),
    }))
}

#[instrument(skip(state, body))]
pub async fn rate_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RateMealRequest>,
) -> Result<Json<RateMealResponse>, ApiError> {
    let stars = match body.rating {
        Some(stars) if (1.0..=5.0).contains(&stars) => stars,
        _ => {
            return Err(ApiError::Validation(vec![
                "Rating must be between 1 and 5".into(),
            ]))
        }
    };
    let (new_average_rating, total_ratings) =
        services::rate_meal(&state, id, stars, body.email.as_deref())
            .await?
            .ok_or(ApiError::NotFound("Meal"))?;
    info!(meal_id = %id, stars, new_average_rating, "rating recorded");
    Ok(Json(RateMealResponse {
        success: true,
        message: "Rating recorded successfully".into(),
        new_average_rating,
        total_ratings,
    }))
}

#[instrument(skip(state, body))]
pub async fn bulk_import(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Json(body): Json<BulkImportRequest>,
) -> Result<Json<BulkImportResponse>, ApiError> {
    let rows = match body.meals {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            return Err(ApiError::Validation(vec![
                "Meals array is required".into(),
            ]))
        }
    };
    let imported_count = services::import_meals(&state, rows).await?;
    info!(imported_count, "bulk import finished");
    Ok(Json(BulkImportResponse {
        success: true,
        message: format!("{imported_count} meals imported successfully"),
        imported_count,
    }))
}

#[instrument(skip(state))]
pub async fn recommend_meals(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let response = recommend::recommend_for_student(&state, &email, query).await?;
    Ok(Json(response))
}
