use std::collections::HashMap;
use airport_core::filter::Page;
use airport_core::policy::{Action, Caller, Denial, Resource, Role};
use airport_core::repository::UserRepository;
use airport_core::user::{normalize_email, validate_password, NewUser, User, UserChanges};
use airport_core::validation::REQUIRED;
use airport_core::ValidationErrors;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError, middleware::auth::require_access, password::hash_in_background,
    query::ListQuery, state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Account fields as sent by clients. Which ones are required depends on
/// the method.
#[derive(Debug, Default, Deserialize)]
pub struct UserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Honoured only when staff create an account.
    pub is_staff: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub is_staff: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self { id: user.id, email: user.email, is_staff: user.is_staff }
    }
}

/// Checked and normalized account fields; the password is still plain.
struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

impl UserRequest {
    fn check(&self, require_all: bool) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = match self.email.as_deref() {
            Some(raw) => match normalize_email(raw) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.merge(e);
                    None
                }
            },
            None if require_all => {
                errors.add("email", REQUIRED);
                None
            }
            None => None,
        };

        match self.password.as_deref() {
            Some(password) => {
                if let Err(e) = validate_password(password) {
                    errors.merge(e);
                }
            }
            None if require_all => errors.add("password", REQUIRED),
            None => {}
        }

        errors.into_result()?;
        Ok(Credentials { email, password: self.password.clone() })
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    let collection = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route_layer(middleware::from_fn_with_state(Resource::Users, require_access));

    collection.route("/users/me", get(get_me).put(update_me).patch(patch_me))
}

/// GET /api/v1/users
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<UserView>>, AppError> {
    let page = ListQuery::new(params).finish(&state.pagination)?;
    Ok(Json(state.store.list_users(page).await?.map(UserView::from)))
}

/// POST /api/v1/users
///
/// Open registration for anonymous callers; staff may also create staff.
async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<UserRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let credentials = request.check(true)?;
    let (Some(email), Some(password)) = (credentials.email, credentials.password) else {
        return Err(AppError::InternalServerError("checked credentials are incomplete".to_string()));
    };
    let is_staff = caller.role() == Role::Staff && request.is_staff.unwrap_or(false);

    let user = state
        .store
        .create_user(&NewUser {
            email,
            password_hash: hash_in_background(password).await?,
            is_staff,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/me
async fn get_me(Extension(caller): Extension<Caller>) -> Result<Json<UserView>, AppError> {
    caller.authorize(Resource::CurrentUser, Action::Retrieve)?;
    let user = caller.user().cloned().ok_or(Denial::Unauthenticated)?;
    Ok(Json(user.into()))
}

/// PUT /api/v1/users/me
async fn update_me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<UserRequest>,
) -> Result<Json<UserView>, AppError> {
    caller.authorize(Resource::CurrentUser, Action::Update)?;
    change_me(&state, &caller, request.check(true)?).await
}

/// PATCH /api/v1/users/me
async fn patch_me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<UserRequest>,
) -> Result<Json<UserView>, AppError> {
    caller.authorize(Resource::CurrentUser, Action::PartialUpdate)?;
    change_me(&state, &caller, request.check(false)?).await
}

async fn change_me(state: &AppState, caller: &Caller, credentials: Credentials) -> Result<Json<UserView>, AppError> {
    let id = caller.user_id().ok_or(Denial::Unauthenticated)?;
    let password_hash = match credentials.password {
        Some(password) => Some(hash_in_background(password).await?),
        None => None,
    };

    let changes = UserChanges {
        email: credentials.email,
        password_hash,
        is_staff: None,
    };
    Ok(Json(state.store.update_user(id, &changes).await?.into()))
}
