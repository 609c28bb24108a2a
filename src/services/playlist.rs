use crate::error::{AppError, Result};
use crate::models::PopulateReport;
use crate::services::{SpotifyApi, TrackResolver};
use std::sync::Arc;

/// Finds or creates a playlist by name and fills it with tracks resolved by name.
///
/// Steps run strictly in order: lookup, create (only when the lookup found
/// nothing), resolve every name, then a single add-tracks call. Any failure
/// ends the run; nothing is retried and nothing already committed at the
/// provider is rolled back.
pub struct PlaylistOrchestrator {
    spotify: Arc<dyn SpotifyApi>,
    resolver: TrackResolver,
}

impl PlaylistOrchestrator {
    pub fn new(spotify: Arc<dyn SpotifyApi>) -> Self {
        Self {
            resolver: TrackResolver::new(spotify.clone()),
            spotify,
        }
    }

    pub async fn ensure_and_populate(
        &self,
        user_id: &str,
        playlist_name: &str,
        track_names: &[String],
        access_token: &str,
    ) -> Result<PopulateReport> {
        let (playlist_id, created) = match self.find_playlist(playlist_name, access_token).await? {
            Some(id) => {
                tracing::info!("Found playlist '{}' ({})", playlist_name, id);
                (id, false)
            }
            None => {
                tracing::info!("No playlist '{}', creating it", playlist_name);
                let id = self
                    .spotify
                    .create_playlist(user_id, playlist_name, access_token)
                    .await?;
                (id, true)
            }
        };

        let (uris, unresolved) = self.resolve_tracks(track_names, access_token).await?;

        if uris.is_empty() {
            tracing::warn!(
                "None of {} tracks resolved, nothing added to playlist {}",
                track_names.len(),
                playlist_id
            );
        } else {
            self.spotify
                .add_tracks(&playlist_id, &uris, access_token)
                .await?;
        }

        Ok(PopulateReport {
            playlist_id,
            created,
            added_uris: uris,
            unresolved,
        })
    }

    async fn find_playlist(&self, playlist_name: &str, access_token: &str) -> Result<Option<String>> {
        let playlists = self.spotify.list_playlists(access_token).await?;
        Ok(playlists
            .into_iter()
            .find(|p| p.name == playlist_name)
            .map(|p| p.id))
    }

    /// Resolved URIs in input order, plus the names that had no match.
    async fn resolve_tracks(
        &self,
        track_names: &[String],
        access_token: &str,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let mut uris = Vec::with_capacity(track_names.len());
        let mut unresolved = Vec::new();

        for name in track_names {
            let found = self
                .resolver
                .resolve(name, access_token)
                .await
                .map_err(|e| AppError::TrackResolutionFailed {
                    track: name.clone(),
                    source: Box::new(e),
                })?;

            if found.is_resolved() {
                uris.push(found.uri);
            } else {
                tracing::warn!("No URI found for track '{}'", name);
                unresolved.push(name.clone());
            }
        }

        Ok((uris, unresolved))
    }
}
