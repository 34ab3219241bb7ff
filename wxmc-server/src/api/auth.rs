//! Bearer token middleware for protected routes
//!
//! Resolves `Authorization: Bearer <token>` against the sessions table and
//! hands the user id to handlers as an [`AuthUser`] extension. Missing,
//! unknown and expired tokens all get the same 401.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;
use wxmc_common::api::authenticate;
use wxmc_common::Error;

use super::ApiError;
use crate::AppState;

/// Authenticated caller, inserted by [`auth_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or_else(|| Error::Unauthorized("Not authenticated".to_string()))?;

    let user_id = authenticate(&state.db, &token).await?;
    debug!("Authenticated user {} for {}", user_id, request.uri().path());

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer` header (scheme is case-insensitive)
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
