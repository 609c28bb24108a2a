//! In-memory [`SpotifyApi`] and a loopback HTTP helper for tests.

use crate::error::{AppError, Result};
use crate::models::{PlaylistSummary, SpotifyTrack};
use crate::services::SpotifyApi;
use async_trait::async_trait;
use axum::Router;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves `app` on an ephemeral loopback port and returns `http://addr/v1`.
pub(crate) async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CurrentUser,
    ListPlaylists,
    CreatePlaylist { user_id: String, name: String },
    Search(String),
    AddTracks { playlist_id: String, uris: Vec<String> },
}

pub(crate) fn track(name: &str, uri: &str, artists: &[&str]) -> SpotifyTrack {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "uri": uri,
        "album": {"name": format!("{} (album)", name)},
        "artists": artists.iter().map(|a| serde_json::json!({"name": a})).collect::<Vec<_>>(),
    }))
    .unwrap()
}

#[derive(Default)]
pub(crate) struct MockSpotify {
    pub playlists: Mutex<Vec<PlaylistSummary>>,
    /// Search results keyed by the exact query name.
    pub catalog: HashMap<String, Vec<SpotifyTrack>>,
    /// Names whose search fails with the given status.
    pub failing_searches: HashMap<String, u16>,
    pub create_status: Option<u16>,
    pub add_status: Option<u16>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockSpotify {
    pub(crate) fn with_playlist(self, id: &str, name: &str) -> Self {
        self.playlists.lock().unwrap().push(PlaylistSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub(crate) fn with_tracks(mut self, query: &str, tracks: Vec<SpotifyTrack>) -> Self {
        self.catalog.insert(query.to_string(), tracks);
        self
    }

    pub(crate) fn failing_search(mut self, query: &str, status: u16) -> Self {
        self.failing_searches.insert(query.to_string(), status);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SpotifyApi for MockSpotify {
    async fn current_user_id(&self, _access_token: &str) -> Result<String> {
        self.record(Call::CurrentUser);
        Ok("provider-user".to_string())
    }

    async fn list_playlists(&self, _access_token: &str) -> Result<Vec<PlaylistSummary>> {
        self.record(Call::ListPlaylists);
        Ok(self.playlists.lock().unwrap().clone())
    }

    async fn create_playlist(&self, user_id: &str, name: &str, _access_token: &str) -> Result<String> {
        self.record(Call::CreatePlaylist {
            user_id: user_id.to_string(),
            name: name.to_string(),
        });
        if let Some(status) = self.create_status {
            return Err(AppError::PlaylistCreateFailed {
                status: Some(status),
            });
        }
        let mut playlists = self.playlists.lock().unwrap();
        let id = format!("created-{}", playlists.len() + 1);
        playlists.push(PlaylistSummary {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn search_tracks(&self, track_name: &str, _access_token: &str) -> Result<Vec<SpotifyTrack>> {
        self.record(Call::Search(track_name.to_string()));
        if let Some(status) = self.failing_searches.get(track_name) {
            return Err(AppError::SearchFailed {
                status: Some(*status),
            });
        }
        Ok(self.catalog.get(track_name).cloned().unwrap_or_default())
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String], _access_token: &str) -> Result<()> {
        self.record(Call::AddTracks {
            playlist_id: playlist_id.to_string(),
            uris: uris.to_vec(),
        });
        if let Some(status) = self.add_status {
            return Err(AppError::PlaylistPopulateFailed {
                status: Some(status),
            });
        }
        Ok(())
    }
}
