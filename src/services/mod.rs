pub mod auth;
#[cfg(test)]
pub(crate) mod mock_spotify;
pub mod playlist;
pub mod provider_sessions;
pub mod session_cache;
pub mod spotify;
pub mod spotify_auth;
pub mod track_resolver;
pub mod user_store;

pub use auth::AuthService;
pub use playlist::PlaylistOrchestrator;
pub use provider_sessions::ProviderSessions;
pub use session_cache::{RedisSessionCache, SessionCache};
pub use spotify::{SpotifyApi, SpotifyClient};
pub use spotify_auth::SpotifyOAuth;
pub use track_resolver::TrackResolver;
pub use user_store::{PgUserStore, UserStore};
