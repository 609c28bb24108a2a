use crate::error::{AppError, Result};
use crate::models::Token;
use crate::services::SpotifyOAuth;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// How long an issued `state` stays valid for the provider callback.
const STATE_TTL_MINUTES: i64 = 10;
const STATE_LEN: usize = 32;

struct PendingAuthorization {
    user_id: Uuid,
    issued_at: DateTime<Utc>,
}

/// Per-user provider authorization: the `state` issued for each redirect and
/// the token obtained once the callback completes. Nothing here is persisted;
/// a restart means every user authorizes again.
pub struct ProviderSessions {
    oauth: SpotifyOAuth,
    pending: RwLock<HashMap<String, PendingAuthorization>>,
    tokens: RwLock<HashMap<Uuid, Token>>,
}

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

impl ProviderSessions {
    pub fn new(oauth: SpotifyOAuth) -> Self {
        Self {
            oauth,
            pending: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Issues a fresh `state` for `user_id` and returns the provider consent URL.
    pub async fn begin(&self, user_id: Uuid) -> Result<String> {
        let state = generate_state();
        let url = self.oauth.authorize_url(&state)?;

        let now = Utc::now();
        let mut pending = self.pending.write().await;
        pending.retain(|_, p| now - p.issued_at < Duration::minutes(STATE_TTL_MINUTES));
        pending.insert(
            state,
            PendingAuthorization {
                user_id,
                issued_at: now,
            },
        );

        tracing::info!("Issued provider authorization for user {}", user_id);
        Ok(url)
    }

    /// Consumes a callback `state`. Unknown, reused or expired values are
    /// rejected with `InvalidState`.
    pub async fn claim_state(&self, state: &str) -> Result<Uuid> {
        let pending = self
            .pending
            .write()
            .await
            .remove(state)
            .ok_or(AppError::InvalidState)?;

        if Utc::now() - pending.issued_at >= Duration::minutes(STATE_TTL_MINUTES) {
            tracing::warn!("Expired authorization state for user {}", pending.user_id);
            return Err(AppError::InvalidState);
        }

        Ok(pending.user_id)
    }

    /// Exchanges `code` and keeps the resulting token for `user_id`.
    pub async fn complete(&self, user_id: Uuid, code: &str) -> Result<()> {
        let token = self.oauth.exchange(code).await?;
        self.store_token(user_id, token).await;
        tracing::info!("Provider authorization completed for user {}", user_id);
        Ok(())
    }

    pub async fn store_token(&self, user_id: Uuid, token: Token) {
        self.tokens.write().await.insert(user_id, token);
    }

    pub async fn token_for(&self, user_id: Uuid) -> Result<Token> {
        self.tokens
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(AppError::ProviderNotAuthorized)
    }

    pub async fn forget(&self, user_id: Uuid) {
        self.tokens.write().await.remove(&user_id);
    }
}
