/**
 * Authentication Middleware
 *
 * Protects the stream routes. The token is read from the `Authorization:
 * Bearer` header, or from the `token` query parameter for `EventSource`
 * clients that cannot set headers. The verified user is attached to the
 * request extensions for the `AuthUser` extractor.
 */

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::auth::AuthError;
use crate::backend::error::{BackendError, RegistrationError};
use crate::backend::server::state::AppState;

/// Authenticated user data extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authentication middleware
///
/// Returns 401 Unauthorized if the token is missing or invalid.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(&request).ok_or_else(|| {
        tracing::warn!(path = %request.uri().path(), "[Auth] Missing bearer token");
        RegistrationError::from(AuthError::MissingToken)
    })?;

    let user = app_state.auth.authenticate(&token).map_err(|e| {
        tracing::warn!(error = %e, "[Auth] Token rejected");
        RegistrationError::from(e)
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Token from the Authorization header, falling back to `?token=`
pub fn bearer_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|t| !t.is_empty())
    })
}

/// Axum extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthenticatedUser>().cloned().ok_or_else(|| {
            tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
            RegistrationError::unauthorized("authentication required")
        })?;

        Ok(AuthUser(user))
    }
}
