use std::collections::HashMap;
use airport_core::crew::{Crew, CrewInput, CrewPatch, CrewTitle};
use airport_core::filter::{CrewFilter, Page};
use airport_core::policy::Resource;
use airport_core::repository::CrewRepository;
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
    error::AppError, lookup::found, middleware::auth::require_access, query::ListQuery,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct CrewListItem {
    pub id: Uuid,
    pub full_name: String,
    pub title: CrewTitle,
}

impl From<Crew> for CrewListItem {
    fn from(crew: Crew) -> Self {
        Self { id: crew.id, full_name: crew.full_name(), title: crew.title }
    }
}

#[derive(Debug, Serialize)]
pub struct CrewDetail {
    #[serde(flatten)]
    pub crew: Crew,
    pub full_name: String,
}

impl From<Crew> for CrewDetail {
    fn from(crew: Crew) -> Self {
        Self { full_name: crew.full_name(), crew }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/crews", get(list_crews).post(create_crew))
        .route(
            "/crews/{id}",
            get(get_crew).put(update_crew).patch(patch_crew).delete(delete_crew),
        )
        .route_layer(middleware::from_fn_with_state(Resource::Crews, require_access))
}

/// GET /api/v1/airport/crews?first_name=&last_name=&title=
async fn list_crews(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<CrewListItem>>, AppError> {
    let query = ListQuery::new(params);
    let filter = CrewFilter {
        first_name: query.text("first_name"),
        last_name: query.text("last_name"),
        title: query.text("title"),
    };
    let page = query.finish(&state.pagination)?;

    let crews = state.store.list_crews(&filter, page).await?;
    Ok(Json(crews.map(CrewListItem::from)))
}

/// GET /api/v1/airport/crews/{id}
async fn get_crew(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CrewDetail>, AppError> {
    Ok(Json(found(state.store.get_crew(id).await?)?.into()))
}

/// POST /api/v1/airport/crews
async fn create_crew(
    State(state): State<AppState>,
    Json(input): Json<CrewInput>,
) -> Result<(StatusCode, Json<Crew>), AppError> {
    let input = input.validate()?;
    let crew = state.store.create_crew(&input).await?;
    Ok((StatusCode::CREATED, Json(crew)))
}

/// PUT /api/v1/airport/crews/{id}
async fn update_crew(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CrewInput>,
) -> Result<Json<Crew>, AppError> {
    let input = input.validate()?;
    Ok(Json(state.store.update_crew(id, &input).await?))
}

/// PATCH /api/v1/airport/crews/{id}
async fn patch_crew(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CrewPatch>,
) -> Result<Json<Crew>, AppError> {
    let existing = found(state.store.get_crew(id).await?)?;
    let input = patch.apply_to(&existing).validate()?;
    Ok(Json(state.store.update_crew(id, &input).await?))
}

/// DELETE /api/v1/airport/crews/{id}
async fn delete_crew(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_crew(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
