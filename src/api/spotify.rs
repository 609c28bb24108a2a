use crate::api::middleware::RequireAuth;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{PlaylistRequest, PopulateReport};
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

pub fn spotify_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", get(authorize))
        .route("/callback", get(callback))
        .route("/create-playlist", post(create_playlist))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    #[serde(default)]
    state: String,
    error: Option<String>,
}

/// Redirects the logged-in user to the provider consent page.
async fn authorize(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
) -> Result<Redirect> {
    let url = state.provider_sessions.begin(claims.sub).await?;
    Ok(Redirect::temporary(&url))
}

async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<Value>> {
    // The state check comes first so a forged callback never reaches the token endpoint.
    let user_id = state.provider_sessions.claim_state(&params.state).await?;

    if let Some(reason) = params.error {
        tracing::warn!("Provider authorization denied for user {}: {}", user_id, reason);
        return Err(AppError::Validation(format!("Authorization denied: {}", reason)));
    }

    let code = params.code.unwrap_or_default();
    state.provider_sessions.complete(user_id, &code).await?;

    Ok(Json(json!({ "status": "authorized" })))
}

async fn create_playlist(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
    Json(req): Json<PlaylistRequest>,
) -> Result<Json<PopulateReport>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let token = state.provider_sessions.token_for(claims.sub).await?;
    let provider_user = state.spotify.current_user_id(&token.access_token).await?;

    tracing::info!(
        "Populating playlist '{}' with {} tracks for user {}",
        req.playlist_name,
        req.track_names.len(),
        claims.sub
    );

    let report = state
        .orchestrator
        .ensure_and_populate(
            &provider_user,
            &req.playlist_name,
            &req.track_names,
            &token.access_token,
        )
        .await?;

    Ok(Json(report))
}
