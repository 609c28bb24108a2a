pub mod spotify;
pub mod user;

pub use spotify::{
    PlaylistRequest, PlaylistSummary, PopulateReport, SpotifyTrack, Token, TrackMatch,
};
pub use user::{AuthResponse, CreateUserRequest, LoginRequest, NewUser, User, UserInfo, UserRole};
