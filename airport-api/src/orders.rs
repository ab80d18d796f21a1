use std::collections::HashMap;
use airport_core::booking::{referenced_flights, validate_tickets};
use airport_core::filter::Page;
use airport_core::order::{FlightSummary, Order, Owner, Ticket, TicketInput};
use airport_core::policy::{Action, Caller, Denial, Resource, Shape};
use airport_core::repository::{FlightRepository, OrderRepository};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError, lookup::found, middleware::auth::require_access, query::ListQuery,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub tickets: Vec<TicketInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderPatch {
    pub tickets: Option<Vec<TicketInput>>,
}

#[derive(Debug, Serialize)]
pub struct TicketView {
    pub id: Uuid,
    pub row: i32,
    pub seat: i32,
    pub flight: FlightSummary,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self { id: ticket.id, row: ticket.row, seat: ticket.seat, flight: ticket.flight }
    }
}

/// Read shape for orders. Staff also see who placed the order.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<TicketView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Owner>,
}

impl OrderView {
    fn new(order: Order, shape: Shape) -> Self {
        let user = matches!(shape, Shape::StaffList | Shape::StaffDetail).then_some(order.owner);
        Self {
            id: order.id,
            created_at: order.created_at,
            tickets: order.tickets.into_iter().map(TicketView::from).collect(),
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketWritten {
    pub id: Uuid,
    pub flight: Uuid,
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderWritten {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<TicketWritten>,
}

impl From<Order> for OrderWritten {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            tickets: order
                .tickets
                .into_iter()
                .map(|t| TicketWritten { id: t.id, flight: t.flight.id, row: t.row, seat: t.seat })
                .collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).patch(patch_order).delete(delete_order),
        )
        .route_layer(middleware::from_fn_with_state(Resource::Orders, require_access))
}

/// GET /api/v1/airport/orders
///
/// Customers see their own orders; staff see everyone's.
async fn list_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<OrderView>>, AppError> {
    let page = ListQuery::new(params).finish(&state.pagination)?;
    let shape = caller.shape(Resource::Orders, Action::List);

    let orders = state.store.list_orders(caller.order_scope(), page).await?;
    Ok(Json(orders.map(|order| OrderView::new(order, shape))))
}

/// GET /api/v1/airport/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    let order = found(state.store.get_order(caller.order_scope(), id).await?)?;
    let shape = caller.shape(Resource::Orders, Action::Retrieve);
    Ok(Json(OrderView::new(order, shape)))
}

/// POST /api/v1/airport/orders
async fn create_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderWritten>), AppError> {
    let owner = caller.user_id().ok_or(Denial::Unauthenticated)?;
    check_tickets(&state, &request.tickets).await?;

    let order = state.store.create_order(owner, &request.tickets).await?;
    tracing::info!("{} placed order {} with {} tickets", caller, order.id, order.tickets.len());
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// PUT /api/v1/airport/orders/{id}
async fn update_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderWritten>, AppError> {
    let scope = caller.order_scope();
    found(state.store.get_order(scope, id).await?)?;
    check_tickets(&state, &request.tickets).await?;

    Ok(Json(state.store.replace_tickets(scope, id, &request.tickets).await?.into()))
}

/// PATCH /api/v1/airport/orders/{id}
///
/// Without `tickets` the order is returned unchanged.
async fn patch_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<OrderWritten>, AppError> {
    let scope = caller.order_scope();
    let existing = found(state.store.get_order(scope, id).await?)?;
    let Some(tickets) = patch.tickets else {
        return Ok(Json(existing.into()));
    };
    check_tickets(&state, &tickets).await?;

    Ok(Json(state.store.replace_tickets(scope, id, &tickets).await?.into()))
}

/// DELETE /api/v1/airport/orders/{id}
async fn delete_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_order(caller.order_scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Seat ranges and in-batch duplicates. Seats already sold are caught by
/// the store when the tickets are written.
async fn check_tickets(state: &AppState, tickets: &[TicketInput]) -> Result<(), AppError> {
    let layouts = state.store.seat_layouts(&referenced_flights(tickets)).await?;
    Ok(validate_tickets(tickets, &layouts)?)
}
