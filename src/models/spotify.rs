use serde::{Deserialize, Serialize};
use validator::Validate;

/// Provider credentials obtained from the authorization-code exchange.
///
/// Held in memory only. The refresh token is kept for completeness but never
/// used: once the provider rejects the access token the user has to go through
/// `/auth` again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `POST /create-playlist`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlaylistRequest {
    #[serde(rename = "playlist")]
    #[validate(length(min = 1, max = 100))]
    pub playlist_name: String,
    #[serde(rename = "values", default)]
    pub track_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
}

/// A track item as returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub name: String,
    pub uri: String,
    pub album: SpotifyAlbum,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

/// Result of resolving a free-text track name. `uri` is empty when nothing matched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackMatch {
    pub artist: String,
    pub album: String,
    pub name: String,
    pub uri: String,
}

impl TrackMatch {
    pub fn is_resolved(&self) -> bool {
        !self.uri.is_empty()
    }
}

impl From<&SpotifyTrack> for TrackMatch {
    fn from(track: &SpotifyTrack) -> Self {
        TrackMatch {
            artist: track
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album: track.album.name.clone(),
            name: track.name.clone(),
            uri: track.uri.clone(),
        }
    }
}

/// Outcome of a successful ensure-and-populate run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulateReport {
    pub playlist_id: String,
    pub created: bool,
    pub added_uris: Vec<String>,
    pub unresolved: Vec<String>,
}
