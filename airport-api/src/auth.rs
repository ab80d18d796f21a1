use airport_core::repository::UserRepository;
use airport_core::user::normalize_email;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    error::AppError,
    middleware::auth::{decode_token, issue_token, TokenType, INVALID_TOKEN},
    password::verify_in_background,
    state::AppState,
};

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(obtain_token))
        .route("/token/refresh", post(refresh_token))
        .route("/token/verify", post(verify_token))
}

/// POST /api/v1/token
async fn obtain_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let unauthorized = || AppError::AuthenticationError(BAD_CREDENTIALS.to_string());

    let email = normalize_email(&request.email).map_err(|_| unauthorized())?;
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(unauthorized)?;

    if !verify_in_background(request.password, user.password_hash.clone()).await? {
        return Err(unauthorized());
    }

    info!("Issued tokens for {}", user.email);
    Ok(Json(TokenPair {
        access: issue_token(&state.auth, &user, TokenType::Access)?,
        refresh: issue_token(&state.auth, &user, TokenType::Refresh)?,
    }))
}

/// POST /api/v1/token/refresh
async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let claims = decode_token(&state.auth, &request.refresh, Some(TokenType::Refresh))?;
    let user = state
        .store
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::AuthenticationError(INVALID_TOKEN.to_string()))?;

    Ok(Json(AccessToken {
        access: issue_token(&state.auth, &user, TokenType::Access)?,
    }))
}

/// POST /api/v1/token/verify
async fn verify_token(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<Value>, AppError> {
    decode_token(&state.auth, &request.token, None)?;
    Ok(Json(json!({})))
}
