use crate::error::Result;
use crate::models::{SpotifyTrack, TrackMatch};
use crate::services::SpotifyApi;
use std::sync::Arc;

/// Resolves free-text track names to provider tracks.
pub struct TrackResolver {
    spotify: Arc<dyn SpotifyApi>,
}

impl TrackResolver {
    pub fn new(spotify: Arc<dyn SpotifyApi>) -> Self {
        Self { spotify }
    }

    /// Returns the first candidate whose title equals `track_name` ignoring
    /// case. An unmatched name yields a `TrackMatch` with an empty uri, not an
    /// error; only a failed search is an error.
    pub async fn resolve(&self, track_name: &str, access_token: &str) -> Result<TrackMatch> {
        let candidates = self.spotify.search_tracks(track_name, access_token).await?;
        let found = best_match(track_name, &candidates);

        if found.is_resolved() {
            tracing::debug!(
                "Track found: artist={} album={} name={}",
                found.artist,
                found.album,
                found.name
            );
        } else {
            tracing::debug!(
                "No exact match for '{}' among {} candidates",
                track_name,
                candidates.len()
            );
        }

        Ok(found)
    }
}

pub fn best_match(track_name: &str, candidates: &[SpotifyTrack]) -> TrackMatch {
    let wanted = track_name.to_lowercase();
    candidates
        .iter()
        .find(|track| track.name.to_lowercase() == wanted)
        .map(TrackMatch::from)
        .unwrap_or_default()
}
