use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Renders an optional provider status code for error messages.
fn status_text(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status code: {}", code),
        None => "no response".to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Music provider authorization required")]
    ProviderNotAuthorized,

    #[error("Failed to exchange code for token: {cause}")]
    TokenExchangeFailed { cause: String },

    #[error("Failed to fetch provider profile ({})", status_text(.status))]
    ProfileFetchFailed { status: Option<u16> },

    #[error("Failed to list playlists ({})", status_text(.status))]
    PlaylistLookupFailed { status: Option<u16> },

    #[error("Track search failed ({})", status_text(.status))]
    SearchFailed { status: Option<u16> },

    #[error("Failed to create playlist ({})", status_text(.status))]
    PlaylistCreateFailed { status: Option<u16> },

    #[error("Failed to add tracks to playlist ({})", status_text(.status))]
    PlaylistPopulateFailed { status: Option<u16> },

    #[error("Failed to resolve track '{track}': {source}")]
    TrackResolutionFailed {
        track: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidCredentials | AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::ProviderNotAuthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidState => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error".to_string())
            }
            AppError::TokenExchangeFailed { .. }
            | AppError::ProfileFetchFailed { .. }
            | AppError::PlaylistLookupFailed { .. }
            | AppError::SearchFailed { .. }
            | AppError::PlaylistCreateFailed { .. }
            | AppError::PlaylistPopulateFailed { .. }
            | AppError::TrackResolutionFailed { .. } => {
                tracing::error!("Provider error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
