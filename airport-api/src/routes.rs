use std::collections::HashMap;
use airport_core::airport::Airport;
use airport_core::filter::{Page, RouteFilter};
use airport_core::policy::Resource;
use airport_core::repository::{AirportRepository, RouteRepository};
use airport_core::route::{Route, RouteInput, RoutePatch};
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

/// Endpoints by airport code.
#[derive(Debug, Serialize)]
pub struct RouteListItem {
    pub id: Uuid,
    pub source: String,
    pub destination: String,
    pub distance: i64,
}

impl From<Route> for RouteListItem {
    fn from(route: Route) -> Self {
        Self {
            id: route.id,
            distance: route.distance(),
            source: route.source.code,
            destination: route.destination.code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RouteDetail {
    pub id: Uuid,
    pub source: Airport,
    pub destination: Airport,
    pub distance: i64,
}

impl From<Route> for RouteDetail {
    fn from(route: Route) -> Self {
        Self {
            id: route.id,
            distance: route.distance(),
            source: route.source,
            destination: route.destination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RouteWritten {
    pub id: Uuid,
    pub source: Uuid,
    pub destination: Uuid,
    pub distance: i64,
}

impl From<Route> for RouteWritten {
    fn from(route: Route) -> Self {
        Self {
            id: route.id,
            distance: route.distance(),
            source: route.source.id,
            destination: route.destination.id,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route(
            "/routes/{id}",
            get(get_route).put(update_route).patch(patch_route).delete(delete_route),
        )
        .route_layer(middleware::from_fn_with_state(Resource::Routes, require_access))
}

/// GET /api/v1/airport/routes?source=<code>&destination=<code>
async fn list_routes(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<RouteListItem>>, AppError> {
    let query = ListQuery::new(params);
    let filter = RouteFilter {
        source: query.text("source"),
        destination: query.text("destination"),
    };
    let page = query.finish(&state.pagination)?;

    let routes = state.store.list_routes(&filter, page).await?;
    Ok(Json(routes.map(RouteListItem::from)))
}

/// GET /api/v1/airport/routes/{id}
async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteDetail>, AppError> {
    Ok(Json(found(state.store.get_route(id).await?)?.into()))
}

/// POST /api/v1/airport/routes
async fn create_route(
    State(state): State<AppState>,
    Json(input): Json<RouteInput>,
) -> Result<(StatusCode, Json<RouteWritten>), AppError> {
    let input = checked(&state, input).await?;
    let route = state.store.create_route(&input).await?;
    Ok((StatusCode::CREATED, Json(route.into())))
}

/// PUT /api/v1/airport/routes/{id}
async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RouteInput>,
) -> Result<Json<RouteWritten>, AppError> {
    found(state.store.get_route(id).await?)?;
    let input = checked(&state, input).await?;
    Ok(Json(state.store.update_route(id, &input).await?.into()))
}

/// PATCH /api/v1/airport/routes/{id}
async fn patch_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RoutePatch>,
) -> Result<Json<RouteWritten>, AppError> {
    let existing = found(state.store.get_route(id).await?)?;
    let input = checked(&state, patch.apply_to(&existing)).await?;
    Ok(Json(state.store.update_route(id, &input).await?.into()))
}

/// DELETE /api/v1/airport/routes/{id}
async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_route(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checked(state: &AppState, input: RouteInput) -> Result<RouteInput, AppError> {
    let mut errors = ValidationErrors::new();
    let source = state.store.get_airport(input.source).await?;
    check_reference(&source, "source", input.source, &mut errors);
    let destination = state.store.get_airport(input.destination).await?;
    check_reference(&destination, "destination", input.destination, &mut errors);
    errors.into_result()?;

    Ok(input.validate()?)
}
