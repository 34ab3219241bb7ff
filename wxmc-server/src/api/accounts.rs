//! Account endpoints: registration, token issue and profile

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use tracing::info;
use wxmc_common::api::{self, LoginForm, RegisterRequest, TokenResponse};
use wxmc_common::db::{get_user, User};
use wxmc_common::Error;

use super::{ApiError, AuthUser};
use crate::AppState;

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(request) = request.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let user = api::register(&state.db, &request).await?;
    info!("Registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /token
///
/// Form-encoded OAuth2 password flow; `username` is the account email.
pub async fn issue_token(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(form) = form.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let token = api::login(&state.db, &form.username, &form.password, state.token_ttl).await?;
    Ok(Json(token))
}

/// GET /users/me
pub async fn current_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let user = get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))?;
    Ok(Json(user))
}

/// Routes that need no token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(issue_token))
}

/// Routes behind the bearer middleware
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(current_user))
}
