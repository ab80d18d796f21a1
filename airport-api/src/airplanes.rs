use std::collections::HashMap;
use airport_core::airplane::{Airplane, AirplaneInput, AirplanePatch, AirplaneType};
use airport_core::filter::{AirplaneFilter, Page};
use airport_core::policy::Resource;
use airport_core::repository::{AirplaneRepository, AirplaneTypeRepository};
use airport_core::ValidationErrors;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    lookup::{check_reference, found},
    middleware::auth::require_access,
    query::ListQuery,
    state::AppState,
};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AirplaneListItem {
    pub id: Uuid,
    pub name: String,
    pub airplane_type: String,
    pub total_seats: i64,
}

impl From<Airplane> for AirplaneListItem {
    fn from(airplane: Airplane) -> Self {
        Self {
            id: airplane.id,
            total_seats: airplane.total_seats(),
            name: airplane.name,
            airplane_type: airplane.airplane_type.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AirplaneDetail {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type: AirplaneType,
    pub total_seats: i64,
}

impl From<Airplane> for AirplaneDetail {
    fn from(airplane: Airplane) -> Self {
        Self {
            id: airplane.id,
            total_seats: airplane.total_seats(),
            name: airplane.name,
            code: airplane.code,
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type: airplane.airplane_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AirplaneWritten {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type: Uuid,
    pub total_seats: i64,
}

impl From<Airplane> for AirplaneWritten {
    fn from(airplane: Airplane) -> Self {
        Self {
            id: airplane.id,
            total_seats: airplane.total_seats(),
            name: airplane.name,
            code: airplane.code,
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type: airplane.airplane_type.id,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airplanes", get(list_airplanes).post(create_airplane))
        .route(
            "/airplanes/{id}",
            get(get_airplane)
                .put(update_airplane)
                .patch(patch_airplane)
                .delete(delete_airplane),
        )
        .route_layer(middleware::from_fn_with_state(Resource::Airplanes, require_access))
}

/// GET /api/v1/airport/airplanes?type=<name>&total_seats=<max>
async fn list_airplanes(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<AirplaneListItem>>, AppError> {
    let mut query = ListQuery::new(params);
    let filter = AirplaneFilter {
        airplane_type: query.text("type"),
        max_total_seats: query.non_negative("total_seats"),
    };
    let page = query.finish(&state.pagination)?;

    let airplanes = state.store.list_airplanes(&filter, page).await?;
    Ok(Json(airplanes.map(AirplaneListItem::from)))
}

/// GET /api/v1/airport/airplanes/{id}
async fn get_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AirplaneDetail>, AppError> {
    let airplane = found(state.store.get_airplane(id).await?)?;
    Ok(Json(airplane.into()))
}

/// POST /api/v1/airport/airplanes
async fn create_airplane(
    State(state): State<AppState>,
    Json(input): Json<AirplaneInput>,
) -> Result<(StatusCode, Json<AirplaneWritten>), AppError> {
    let input = checked(&state, input).await?;
    let airplane = state.store.create_airplane(&input).await?;
    Ok((StatusCode::CREATED, Json(airplane.into())))
}

/// PUT /api/v1/airport/airplanes/{id}
async fn update_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AirplaneInput>,
) -> Result<Json<AirplaneWritten>, AppError> {
    found(state.store.get_airplane(id).await?)?;
    let input = checked(&state, input).await?;
    Ok(Json(state.store.update_airplane(id, &input).await?.into()))
}

/// PATCH /api/v1/airport/airplanes/{id}
async fn patch_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AirplanePatch>,
) -> Result<Json<AirplaneWritten>, AppError> {
    let existing = found(state.store.get_airplane(id).await?)?;
    let input = checked(&state, patch.apply_to(&existing)).await?;
    Ok(Json(state.store.update_airplane(id, &input).await?.into()))
}

/// DELETE /api/v1/airport/airplanes/{id}
async fn delete_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_airplane(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checked(state: &AppState, input: AirplaneInput) -> Result<AirplaneInput, AppError> {
    let input = input.validate()?;
    let mut errors = ValidationErrors::new();
    let airplane_type = state.store.get_airplane_type(input.airplane_type).await?;
    check_reference(&airplane_type, "airplane_type", input.airplane_type, &mut errors);
    errors.into_result()?;
    Ok(input)
}
