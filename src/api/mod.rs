pub mod auth;
pub mod health;
pub mod middleware;
pub mod spotify;

use crate::services::{AuthService, PlaylistOrchestrator, ProviderSessions, SpotifyApi};
use axum::Router;
use std::sync::Arc;

pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub provider_sessions: Arc<ProviderSessions>,
    pub spotify: Arc<dyn SpotifyApi>,
    pub orchestrator: Arc<PlaylistOrchestrator>,
}

/// Every route served under `/api/v1`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth::auth_routes())
        .merge(spotify::spotify_routes())
        .merge(health::health_routes())
}
