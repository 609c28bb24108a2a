use crate::config::SpotifyConfig;
use crate::error::{AppError, Result};
use crate::models::Token;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
}

/// Authorization-code flow against the provider's accounts service.
///
/// Tokens are returned as-is: there is no expiry tracking and no refresh.
pub struct SpotifyOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    scope: String,
    client: Client,
}

impl SpotifyOAuth {
    pub fn new(config: &SpotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            scope: config.scope.clone(),
            client,
        })
    }

    /// URL of the provider consent page for the given `state`.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid authorization URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchanges an authorization code for a token pair. The caller must have
    /// validated the callback `state` first.
    pub async fn exchange(&self, code: &str) -> Result<Token> {
        if code.is_empty() {
            return Err(AppError::Validation("Authorization code not found".to_string()));
        }

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to exchange token: {}", e);
                AppError::TokenExchangeFailed {
                    cause: e.to_string(),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token endpoint returned {} - {}", status, body);
            return Err(AppError::TokenExchangeFailed {
                cause: format!("token endpoint returned {}", status),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| AppError::TokenExchangeFailed {
            cause: format!("invalid token response: {}", e),
        })?;

        if token.access_token.is_empty() {
            return Err(AppError::TokenExchangeFailed {
                cause: "empty access token".to_string(),
            });
        }

        Ok(Token {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }
}
