use crate::api::middleware::RequireAuth;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{AuthResponse, CreateUserRequest, LoginRequest, UserInfo};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserInfo>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state.auth_service.register(req).await?;
    Ok(Json(user))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = state.auth_service.login(req).await?;
    Ok(Json(response))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
) -> Result<StatusCode> {
    state.auth_service.logout(claims.sub).await?;
    state.provider_sessions.forget(claims.sub).await;
    Ok(StatusCode::OK)
}

async fn me(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<UserInfo>> {
    let user = state.auth_service.get_user_by_id(claims.sub).await?;
    Ok(Json(user.into()))
}
