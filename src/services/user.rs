//! User service
//!
//! Registration, login/logout and session validation. Sessions are opaque
//! UUID tokens stored server-side; an expired token is deleted on first use
//! and treated as anonymous.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User};
use crate::services::password::{hash_password, verify_password};

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (unknown user or wrong password)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("Username already taken: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for registration and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username is required".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password is required".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(username.to_string()));
        }

        let hash = hash_password(password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(username, &hash)
            .await
            .context("Failed to create user")?;

        tracing::info!(username = %user.username, "User registered");
        Ok(user)
    }

    /// Validate credentials and open a new session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::InvalidCredentials);
        }

        let session = Session::new(user.id, self.session_expiration_days);
        self.session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!(username = %user.username, "User logged in");
        Ok(session)
    }

    /// Invalidate a session token. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// deleted on the spot.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>> {
        let session = match self.session_repo.get_by_id(token).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo.delete(token).await?;
            return Ok(None);
        }

        self.user_repo.get_by_id(session.user_id).await
    }

    /// Delete all expired sessions, returning the number removed.
    pub async fn purge_expired_sessions(&self) -> Result<i64> {
        self.session_repo.delete_expired().await
    }
}
