use std::collections::{HashMap, HashSet};
use airport_core::filter::{FlightFilter, Page};
use airport_core::flight::{Flight, FlightInput, FlightPatch, Seat};
use airport_core::policy::Resource;
use airport_core::repository::{AirplaneRepository, CrewRepository, FlightRepository, RouteRepository};
use airport_core::booking::missing_object;
use airport_core::ValidationErrors;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    airplanes::AirplaneListItem,
    error::AppError,
    lookup::{check_reference, found},
    middleware::auth::require_access,
    query::ListQuery,
    routes::RouteDetail,
    state::AppState,
};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FlightListItem {
    pub id: Uuid,
    /// "AAA -> AAL"
    pub route: String,
    pub airplane: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: i64,
}

impl From<Flight> for FlightListItem {
    fn from(flight: Flight) -> Self {
        Self {
            id: flight.id,
            route: flight.route.code_label(),
            available_seats: flight.available_seats(),
            airplane: flight.airplane.name,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlightDetail {
    pub id: Uuid,
    pub route: RouteDetail,
    pub airplane: AirplaneListItem,
    pub crew: Vec<String>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub available_seats: i64,
    pub taken_places: Vec<Seat>,
}

impl FlightDetail {
    fn new(flight: Flight, taken_places: Vec<Seat>) -> Self {
        Self {
            id: flight.id,
            available_seats: flight.available_seats(),
            crew: flight.crew.iter().map(|c| c.full_name()).collect(),
            route: flight.route.into(),
            airplane: flight.airplane.into(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            taken_places,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlightWritten {
    pub id: Uuid,
    pub route: Uuid,
    pub airplane: Uuid,
    pub crew: Vec<Uuid>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

impl From<Flight> for FlightWritten {
    fn from(flight: Flight) -> Self {
        Self {
            id: flight.id,
            route: flight.route.id,
            airplane: flight.airplane.id,
            crew: flight.crew.iter().map(|c| c.id).collect(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(list_flights).post(create_flight))
        .route(
            "/flights/{id}",
            get(get_flight).put(update_flight).patch(patch_flight).delete(delete_flight),
        )
        .route_layer(middleware::from_fn_with_state(Resource::Flights, require_access))
}

/// GET /api/v1/airport/flights?route=<ids>&airplane=<ids>&crew=<ids>&departure_date=YYYY-MM-DD
async fn list_flights(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<FlightListItem>>, AppError> {
    let mut query = ListQuery::new(params);
    let filter = FlightFilter {
        routes: query.ids("route"),
        airplanes: query.ids("airplane"),
        crew: query.ids("crew"),
        departure_date: query.date("departure_date"),
    };
    let page = query.finish(&state.pagination)?;

    let flights = state.store.list_flights(&filter, page).await?;
    Ok(Json(flights.map(FlightListItem::from)))
}

/// GET /api/v1/airport/flights/{id}
async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightDetail>, AppError> {
    let flight = found(state.store.get_flight(id).await?)?;
    let taken_places = state.store.taken_seats(id).await?;
    Ok(Json(FlightDetail::new(flight, taken_places)))
}

/// POST /api/v1/airport/flights
async fn create_flight(
    State(state): State<AppState>,
    Json(input): Json<FlightInput>,
) -> Result<(StatusCode, Json<FlightWritten>), AppError> {
    let input = input.validate_new(Utc::now())?;
    check_references(&state, &input).await?;

    let flight = state.store.create_flight(&input).await?;
    Ok((StatusCode::CREATED, Json(flight.into())))
}

/// PUT /api/v1/airport/flights/{id}
async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<FlightInput>,
) -> Result<Json<FlightWritten>, AppError> {
    let existing = found(state.store.get_flight(id).await?)?;
    save(&state, &existing, input).await
}

/// PATCH /api/v1/airport/flights/{id}
async fn patch_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FlightPatch>,
) -> Result<Json<FlightWritten>, AppError> {
    let existing = found(state.store.get_flight(id).await?)?;
    let input = patch.apply_to(&existing);
    save(&state, &existing, input).await
}

/// DELETE /api/v1/airport/flights/{id}
async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_flight(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn save(state: &AppState, existing: &Flight, input: FlightInput) -> Result<Json<FlightWritten>, AppError> {
    let input = input.validate_change(existing, Utc::now())?;
    check_references(state, &input).await?;
    Ok(Json(state.store.update_flight(existing.id, &input).await?.into()))
}

async fn check_references(state: &AppState, input: &FlightInput) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    let route = state.store.get_route(input.route).await?;
    check_reference(&route, "route", input.route, &mut errors);
    let airplane = state.store.get_airplane(input.airplane).await?;
    check_reference(&airplane, "airplane", input.airplane, &mut errors);

    if !input.crew.is_empty() {
        let known: HashSet<Uuid> = state
            .store
            .find_crews(&input.crew)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        for id in input.crew.iter().filter(|id| !known.contains(id)) {
            errors.add("crew", missing_object(*id));
        }
    }

    Ok(errors.into_result()?)
}
