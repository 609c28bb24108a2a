use crate::error::{AppError, Result};
use crate::models::{PlaylistSummary, SpotifyTrack};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Upper bound on candidates fetched per track search.
pub const SEARCH_LIMIT: u32 = 50;

const PLAYLIST_PAGE_LIMIT: u32 = 50;
const MAX_PLAYLIST_PAGES: usize = 200;
const PLAYLIST_DESCRIPTION: &str = "Created with spf-playlist";

/// The provider endpoints the playlist workflow depends on.
///
/// Every call takes the caller's access token explicitly; implementations hold
/// no per-user state.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Provider-side id of the user the token belongs to.
    async fn current_user_id(&self, access_token: &str) -> Result<String>;

    /// All playlists of the token's user, in provider order.
    async fn list_playlists(&self, access_token: &str) -> Result<Vec<PlaylistSummary>>;

    /// Creates a public playlist and returns its id.
    async fn create_playlist(&self, user_id: &str, name: &str, access_token: &str) -> Result<String>;

    /// Up to [`SEARCH_LIMIT`] tracks whose title matches `track_name`.
    async fn search_tracks(&self, track_name: &str, access_token: &str) -> Result<Vec<SpotifyTrack>>;

    async fn add_tracks(&self, playlist_id: &str, uris: &[String], access_token: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistSummary>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

/// Search query for a free-text title. Spaces are escaped to `+` when the
/// query string is encoded.
pub fn search_query(track_name: &str) -> String {
    format!("track:{}", track_name)
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    api_base: String,
    client: Client,
}

impl SpotifyClient {
    pub fn new(api_base: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid provider base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Provider base URL cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn search_url(&self, track_name: &str) -> Result<Url> {
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut()
            .append_pair("q", &search_query(track_name))
            .append_pair("type", "track")
            .append_pair("limit", &SEARCH_LIMIT.to_string());
        Ok(url)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn current_user_id(&self, access_token: &str) -> Result<String> {
        let url = self.endpoint(&["me"])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Profile request failed: {}", e);
                AppError::ProfileFetchFailed { status: None }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Profile request returned {}", status);
            return Err(AppError::ProfileFetchFailed {
                status: Some(status.as_u16()),
            });
        }

        let profile: UserProfile = response.json().await.map_err(|e| {
            tracing::error!("Failed to decode user profile: {}", e);
            AppError::ProfileFetchFailed { status: None }
        })?;

        Ok(profile.id)
    }

    async fn list_playlists(&self, access_token: &str) -> Result<Vec<PlaylistSummary>> {
        let mut url = self.endpoint(&["me", "playlists"])?;
        url.query_pairs_mut()
            .append_pair("limit", &PLAYLIST_PAGE_LIMIT.to_string());

        let mut playlists = Vec::new();
        let mut next = Some(url);
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            pages += 1;
            if pages > MAX_PLAYLIST_PAGES {
                tracing::warn!("Stopped listing playlists after {} pages", MAX_PLAYLIST_PAGES);
                break;
            }

            let response = self
                .client
                .get(page_url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("Playlist listing failed: {}", e);
                    AppError::PlaylistLookupFailed { status: None }
                })?;

            if !response.status().is_success() {
                let status = response.status();
                tracing::error!("Playlist listing returned {}", status);
                return Err(AppError::PlaylistLookupFailed {
                    status: Some(status.as_u16()),
                });
            }

            let page: PlaylistPage = response.json().await.map_err(|e| {
                tracing::error!("Failed to decode playlist page: {}", e);
                AppError::PlaylistLookupFailed { status: None }
            })?;

            playlists.extend(page.items);
            next = match page.next {
                Some(link) => Some(Url::parse(&link).map_err(|e| {
                    tracing::error!("Invalid next link {}: {}", link, e);
                    AppError::PlaylistLookupFailed { status: None }
                })?),
                None => None,
            };
        }

        tracing::debug!("Listed {} playlists", playlists.len());
        Ok(playlists)
    }

    async fn create_playlist(&self, user_id: &str, name: &str, access_token: &str) -> Result<String> {
        let url = self.endpoint(&["users", user_id, "playlists"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&json!({
                "name": name,
                "description": PLAYLIST_DESCRIPTION,
                "public": true,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Create playlist request failed: {}", e);
                AppError::PlaylistCreateFailed { status: None }
            })?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Error creating playlist: {} - {}", status, body);
            return Err(AppError::PlaylistCreateFailed {
                status: Some(status.as_u16()),
            });
        }

        let created: CreatedPlaylist = response.json().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Unable to extract playlist ID from response: {}", e))
        })?;

        tracing::info!("Created playlist '{}' ({})", name, created.id);
        Ok(created.id)
    }

    async fn search_tracks(&self, track_name: &str, access_token: &str) -> Result<Vec<SpotifyTrack>> {
        let url = self.search_url(track_name)?;
        tracing::debug!("Searching provider: {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Search request failed: {}", e);
                AppError::SearchFailed { status: None }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Unexpected search status code: {}", status);
            return Err(AppError::SearchFailed {
                status: Some(status.as_u16()),
            });
        }

        let data: SearchResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to decode search response: {}", e);
            AppError::SearchFailed { status: None }
        })?;

        Ok(data.tracks.items)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String], access_token: &str) -> Result<()> {
        let url = self.endpoint(&["playlists", playlist_id, "tracks"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&json!({ "uris": uris }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Add tracks request failed: {}", e);
                AppError::PlaylistPopulateFailed { status: None }
            })?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            tracing::error!("Failed to add tracks to playlist {}: {}", playlist_id, status);
            return Err(AppError::PlaylistPopulateFailed {
                status: Some(status.as_u16()),
            });
        }

        tracing::info!("Added {} tracks to playlist {}", uris.len(), playlist_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_spotify::serve;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode as HttpStatus},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn client(base: &str) -> SpotifyClient {
        SpotifyClient::new(base.to_string(), Duration::from_secs(5)).unwrap()
    }

    fn bearer(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_search_url_escapes_spaces() {
        let client = client("http://localhost:1/v1");
        let url = client.search_url("Let It Be").unwrap();
        assert_eq!(url.path(), "/v1/search");
        assert_eq!(
            url.query(),
            Some("q=track%3ALet+It+Be&type=track&limit=50")
        );

        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["q"], "track:Let It Be");
    }

    #[tokio::test]
    async fn test_search_decodes_items_and_sends_bearer() {
        let seen = Arc::new(Mutex::new(Vec::<(String, String)>::new()));
        let app = Router::new()
            .route(
                "/v1/search",
                get(
                    |State(seen): State<Arc<Mutex<Vec<(String, String)>>>>,
                     headers: HeaderMap,
                     Query(q): Query<HashMap<String, String>>| async move {
                        seen.lock().unwrap().push((bearer(&headers), q["q"].clone()));
                        Json(serde_json::json!({
                            "tracks": {"items": [{
                                "name": "Yesterday",
                                "uri": "spotify:track:1",
                                "album": {"name": "Help!"},
                                "artists": [{"name": "The Beatles"}]
                            }]}
                        }))
                    },
                ),
            )
            .with_state(seen.clone());
        let base = serve(app).await;

        let tracks = client(&base).search_tracks("Yesterday", "tok").await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri, "spotify:track:1");
        assert_eq!(
            seen.lock().unwrap()[0],
            ("Bearer tok".to_string(), "track:Yesterday".to_string())
        );
    }

    #[tokio::test]
    async fn test_search_server_error_maps_to_search_failed() {
        let app = Router::new().route(
            "/v1/search",
            get(|| async { HttpStatus::INTERNAL_SERVER_ERROR }),
        );
        let base = serve(app).await;

        let err = client(&base).search_tracks("Yesterday", "tok").await.unwrap_err();
        assert!(matches!(err, AppError::SearchFailed { status: Some(500) }));
    }

    #[tokio::test]
    async fn test_search_transport_failure_has_no_status() {
        // Bind and immediately drop a listener to get a port nobody serves.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}/v1", addr))
            .search_tracks("Yesterday", "tok")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SearchFailed { status: None }));
    }

    #[tokio::test]
    async fn test_list_playlists_follows_next_links() {
        // The handler builds its next link from the bound address, which is
        // only known after serving; share it through the state cell.
        let cell = Arc::new(Mutex::new(String::new()));
        let app = Router::new()
            .route(
                "/v1/me/playlists",
                get(
                    |State(base): State<Arc<Mutex<String>>>,
                     Query(q): Query<HashMap<String, String>>| async move {
                        let base = base.lock().unwrap().clone();
                        if q.get("offset").map(String::as_str) == Some("50") {
                            Json(serde_json::json!({
                                "items": [{"id": "P2", "name": "Second"}],
                                "next": null
                            }))
                        } else {
                            Json(serde_json::json!({
                                "items": [{"id": "P1", "name": "First"}],
                                "next": format!("{}/me/playlists?offset=50&limit=50", base)
                            }))
                        }
                    },
                ),
            )
            .with_state(cell.clone());
        let base = serve(app).await;
        *cell.lock().unwrap() = base.clone();

        let playlists = client(&base).list_playlists("tok").await.unwrap();
        let ids: Vec<_> = playlists.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn test_create_playlist_requires_created_status() {
        let app = Router::new()
            .route(
                "/v1/users/:user_id/playlists",
                post(
                    |Path(user_id): Path<String>, Json(body): Json<Value>| async move {
                        if user_id == "alice" && body["name"] == "Test" && body["public"] == true {
                            (HttpStatus::CREATED, Json(serde_json::json!({"id": "NEW1"})))
                        } else {
                            (HttpStatus::OK, Json(serde_json::json!({"id": "WRONG"})))
                        }
                    },
                ),
            );
        let base = serve(app).await;
        let client = client(&base);

        assert_eq!(
            client.create_playlist("alice", "Test", "tok").await.unwrap(),
            "NEW1"
        );

        let err = client.create_playlist("bob", "Test", "tok").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::PlaylistCreateFailed { status: Some(200) }
        ));
    }

    #[tokio::test]
    async fn test_add_tracks_sends_uris_in_order() {
        let received = Arc::new(Mutex::new(Vec::<Value>::new()));
        let app = Router::new()
            .route(
                "/v1/playlists/:id/tracks",
                post(
                    |State(received): State<Arc<Mutex<Vec<Value>>>>,
                     Path(id): Path<String>,
                     Json(body): Json<Value>| async move {
                        received.lock().unwrap().push(body);
                        if id == "P1" {
                            HttpStatus::OK
                        } else {
                            HttpStatus::FORBIDDEN
                        }
                    },
                ),
            )
            .with_state(received.clone());
        let base = serve(app).await;
        let client = client(&base);

        let uris = vec!["spotify:track:a".to_string(), "spotify:track:b".to_string()];
        client.add_tracks("P1", &uris, "tok").await.unwrap();
        assert_eq!(
            received.lock().unwrap()[0],
            serde_json::json!({"uris": ["spotify:track:a", "spotify:track:b"]})
        );

        let err = client.add_tracks("P9", &uris, "tok").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::PlaylistPopulateFailed { status: Some(403) }
        ));
    }

    #[tokio::test]
    async fn test_current_user_id() {
        let app = Router::new().route(
            "/v1/me",
            get(|headers: HeaderMap| async move {
                if bearer(&headers) == "Bearer tok" {
                    (HttpStatus::OK, Json(serde_json::json!({"id": "alice"})))
                } else {
                    (HttpStatus::UNAUTHORIZED, Json(serde_json::json!({})))
                }
            }),
        );
        let base = serve(app).await;
        let client = client(&base);

        assert_eq!(client.current_user_id("tok").await.unwrap(), "alice");
        let err = client.current_user_id("expired").await.unwrap_err();
        assert!(matches!(err, AppError::ProfileFetchFailed { status: Some(401) }));
    }
}
