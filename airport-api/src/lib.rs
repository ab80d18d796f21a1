use axum::{
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod airplane_types;
pub mod airplanes;
pub mod airports;
pub mod auth;
pub mod crews;
pub mod error;
pub mod flights;
pub mod lookup;
pub mod middleware;
pub mod orders;
pub mod password;
pub mod query;
pub mod routes;
pub mod state;
pub mod users;
pub mod weather;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT]);

    let airport = Router::new()
        .merge(airplane_types::routes())
        .merge(airplanes::routes())
        .merge(crews::routes())
        .merge(airports::routes())
        .merge(routes::routes())
        .merge(flights::routes())
        .merge(orders::routes());

    let api = Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .nest("/airport", airport);

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .layer(from_fn_with_state(state.clone(), middleware::auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
