use std::collections::HashMap;
use airport_core::airplane::{AirplaneType, AirplaneTypeInput, AirplaneTypePatch};
use airport_core::filter::Page;
use airport_core::policy::Resource;
use airport_core::repository::AirplaneTypeRepository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::AppError, lookup::found, middleware::auth::require_access, query::ListQuery,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airplane-types", get(list_airplane_types).post(create_airplane_type))
        .route(
            "/airplane-types/{id}",
            get(get_airplane_type)
                .put(update_airplane_type)
                .patch(patch_airplane_type)
                .delete(delete_airplane_type),
        )
        .route_layer(middleware::from_fn_with_state(Resource::AirplaneTypes, require_access))
}

/// GET /api/v1/airport/airplane-types
async fn list_airplane_types(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<AirplaneType>>, AppError> {
    let page = ListQuery::new(params).finish(&state.pagination)?;
    Ok(Json(state.store.list_airplane_types(page).await?))
}

/// GET /api/v1/airport/airplane-types/{id}
async fn get_airplane_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AirplaneType>, AppError> {
    Ok(Json(found(state.store.get_airplane_type(id).await?)?))
}

/// POST /api/v1/airport/airplane-types
async fn create_airplane_type(
    State(state): State<AppState>,
    Json(input): Json<AirplaneTypeInput>,
) -> Result<(StatusCode, Json<AirplaneType>), AppError> {
    let input = input.validate()?;
    let airplane_type = state.store.create_airplane_type(&input).await?;
    Ok((StatusCode::CREATED, Json(airplane_type)))
}

/// PUT /api/v1/airport/airplane-types/{id}
async fn update_airplane_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AirplaneTypeInput>,
) -> Result<Json<AirplaneType>, AppError> {
    let input = input.validate()?;
    Ok(Json(state.store.update_airplane_type(id, &input).await?))
}

/// PATCH /api/v1/airport/airplane-types/{id}
async fn patch_airplane_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AirplaneTypePatch>,
) -> Result<Json<AirplaneType>, AppError> {
    let existing = found(state.store.get_airplane_type(id).await?)?;
    let input = patch.apply_to(&existing).validate()?;
    Ok(Json(state.store.update_airplane_type(id, &input).await?))
}

/// DELETE /api/v1/airport/airplane-types/{id}
async fn delete_airplane_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_airplane_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
