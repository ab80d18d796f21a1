use std::collections::HashMap;
use airport_core::airport::{Airport, AirportInput, AirportPatch};
use airport_core::filter::{AirportFilter, Page};
use airport_core::policy::Resource;
use airport_core::repository::AirportRepository;
use airport_core::weather::Weather;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::AppError, lookup::found, middleware::auth::require_access, query::ListQuery,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct AirportListItem {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

impl From<Airport> for AirportListItem {
    fn from(airport: Airport) -> Self {
        Self {
            id: airport.id,
            code: airport.code,
            name: airport.name,
            city: airport.city,
            country: airport.country,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AirportDetail {
    #[serde(flatten)]
    pub airport: Airport,
    pub weather: Option<Weather>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/airports", get(list_airports).post(create_airport))
        .route(
            "/airports/{id}",
            get(get_airport)
                .put(update_airport)
                .patch(patch_airport)
                .delete(delete_airport),
        )
        .route_layer(middleware::from_fn_with_state(Resource::Airports, require_access))
}

/// GET /api/v1/airport/airports?code=&name=&city=&country=
async fn list_airports(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<AirportListItem>>, AppError> {
    let query = ListQuery::new(params);
    let filter = AirportFilter {
        code: query.text("code"),
        name: query.text("name"),
        city: query.text("city"),
        country: query.text("country"),
    };
    let page = query.finish(&state.pagination)?;

    let airports = state.store.list_airports(&filter, page).await?;
    Ok(Json(airports.map(AirportListItem::from)))
}

/// GET /api/v1/airport/airports/{id}
///
/// Includes current weather when a provider is configured. A failing
/// provider degrades to `"weather": null`.
async fn get_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AirportDetail>, AppError> {
    let airport = found(state.store.get_airport(id).await?)?;

    let weather = match state.weather.current(&airport).await {
        Ok(weather) => weather,
        Err(e) => {
            warn!("Weather lookup for {} failed: {:#}", airport.code, e);
            None
        }
    };

    Ok(Json(AirportDetail { airport, weather }))
}

/// POST /api/v1/airport/airports
async fn create_airport(
    State(state): State<AppState>,
    Json(input): Json<AirportInput>,
) -> Result<(StatusCode, Json<Airport>), AppError> {
    let input = input.normalize()?;
    let airport = state.store.create_airport(&input).await?;
    Ok((StatusCode::CREATED, Json(airport)))
}

/// PUT /api/v1/airport/airports/{id}
async fn update_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AirportInput>,
) -> Result<Json<Airport>, AppError> {
    let input = input.normalize()?;
    Ok(Json(state.store.update_airport(id, &input).await?))
}

/// PATCH /api/v1/airport/airports/{id}
async fn patch_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AirportPatch>,
) -> Result<Json<Airport>, AppError> {
    let existing = found(state.store.get_airport(id).await?)?;
    let input = patch.apply_to(&existing).normalize()?;
    Ok(Json(state.store.update_airport(id, &input).await?))
}

/// DELETE /api/v1/airport/airports/{id}
async fn delete_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_airport(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
