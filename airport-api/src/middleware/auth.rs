use airport_core::policy::{Action, Caller, Resource};
use airport_core::repository::UserRepository;
use airport_core::user::User;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::{AppState, AuthConfig}};

pub const INVALID_TOKEN: &str = "Given token not valid for any token type";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

pub fn issue_token(auth: &AuthConfig, user: &User, token_type: TokenType) -> Result<String, AppError> {
    let lifetime = match token_type {
        TokenType::Access => auth.access_expiration,
        TokenType::Refresh => auth.refresh_expiration,
    };
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        token_type,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(lifetime as i64)).timestamp(),
        jti: Uuid::new_v4(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// Decodes and checks a token. `expected` restricts the token type; `None`
/// accepts either.
pub fn decode_token(auth: &AuthConfig, token: &str, expected: Option<TokenType>) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::AuthenticationError(INVALID_TOKEN.to_string())
    })?;

    match expected {
        Some(token_type) if token_data.claims.token_type != token_type => {
            Err(AppError::AuthenticationError(INVALID_TOKEN.to_string()))
        }
        _ => Ok(token_data.claims),
    }
}

// ============================================================================
// Caller Resolution Middleware
// ============================================================================

/// Resolves the bearer token (if any) to a `Caller` and stores it in the
/// request extensions. A request without an `Authorization` header is
/// anonymous; a bad token is rejected even on public endpoints.
pub async fn authenticate(
    State(state): State<AppState>,
    header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = match header {
        Ok(TypedHeader(Authorization(bearer))) => {
            let claims = decode_token(&state.auth, bearer.token(), Some(TokenType::Access))?;
            // Reloaded every time so staff changes and deletions apply at once.
            let user = state
                .store
                .get_user(claims.sub)
                .await?
                .ok_or_else(|| AppError::AuthenticationError("User not found".to_string()))?;
            Caller::Authenticated(user)
        }
        Err(rejection) if rejection.is_missing() => Caller::Anonymous,
        Err(_) => {
            return Err(AppError::AuthenticationError(
                "Authorization header must contain a bearer token".to_string(),
            ))
        }
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

// ============================================================================
// Access Policy Middleware
// ============================================================================

/// Route layer applying the access table for `resource`. The action comes
/// from the method and whether the matched route carries an `{id}`.
pub async fn require_access(
    State(resource): State<Resource>,
    Extension(caller): Extension<Caller>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let has_id = req
        .extensions()
        .get::<MatchedPath>()
        .is_some_and(|path| path.as_str().contains("{id}"));

    if let Some(action) = Action::resolve(req.method().as_str(), has_id) {
        if let Err(denial) = caller.authorize(resource, action) {
            tracing::debug!("{} denied {:?} on {:?}", caller, action, resource);
            return Err(denial.into());
        }
    }

    Ok(next.run(req).await)
}
