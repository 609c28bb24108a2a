use crate::error::{AppError, Result};
use crate::models::{AuthResponse, CreateUserRequest, LoginRequest, NewUser, User, UserInfo, UserRole};
use crate::services::{SessionCache, UserStore};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionCache>,
    jwt_secret: String,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionCache>,
        jwt_secret: String,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            jwt_secret,
            session_ttl,
        }
    }

    pub async fn register(&self, req: CreateUserRequest) -> Result<UserInfo> {
        let password_hash = self.hash_password(&req.password)?;

        let user = self
            .users
            .insert_user(NewUser {
                name: req.name,
                email: normalize_email(&req.email),
                password_hash,
                // Roles are granted out of band, never by the caller.
                role: UserRole::User,
            })
            .await?;

        tracing::info!("Registered user {} ({})", user.email, user.id);
        Ok(user.into())
    }

    /// Verifies credentials, issues a session token and records it in the session cache.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let user = self
            .users
            .find_by_email(&normalize_email(&req.email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.verify_password(&req.password, &user.password_hash)?;

        if !user.is_active {
            tracing::warn!("Login attempt for inactive user {}", user.id);
            return Err(AppError::Forbidden);
        }

        let token = self.generate_token(&user)?;
        self.sessions.set(user.id, &token, self.session_ttl).await?;

        tracing::info!("User has been logged in: {}", user.email);
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        self.sessions.delete(user_id).await?;
        tracing::info!("User {} has been logged out", user_id);
        Ok(())
    }

    /// Accepts a token only if its signature is valid and it is still the
    /// session recorded for its user.
    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        let claims = token_data.claims;
        match self.sessions.get(claims.sub).await? {
            Some(active) if active == token => Ok(claims),
            _ => Err(AppError::Unauthorized),
        }
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> Result<()> {
        let parsed_hash =
            PasswordHash::new(password_hash)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)
    }

    fn generate_token(&self, user: &User) -> Result<String> {
        let ttl = chrono::Duration::seconds(self.session_ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
