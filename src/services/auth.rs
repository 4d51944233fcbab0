//! Signed-in state for the app.
//!
//! Validates input locally, throttles login attempts, and keeps the current
//! user in memory on top of an [`AuthApi`].

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::clients::ClientError;
use crate::clients::auth::AuthApi;
use crate::models::{GoogleLoginData, LoginCredentials, ProfileUpdate, SignUpCredentials, User};
use crate::rate_limit::RateLimiter;
use crate::validation::{validate_email, validate_full_name, validate_password, validate_username};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Too many login attempts. Please try again later.")]
    RateLimited,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{0}")]
    Storage(String),

    #[error(transparent)]
    Client(ClientError),
}

impl From<ClientError> for AuthError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Storage(message) => Self::Storage(message),
            other => Self::Client(other),
        }
    }
}

pub struct AuthSession {
    api: Arc<dyn AuthApi>,
    limiter: RateLimiter,
    user: RwLock<Option<User>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, limiter: RateLimiter) -> Self {
        Self {
            api,
            limiter,
            user: RwLock::new(None),
        }
    }

    /// Restores a previous session. Signed in only if both a token and a user
    /// record were persisted.
    pub async fn initialize(&self) {
        self.api.initialize().await;

        let token = self.api.token().await;
        let user = self.api.current_user().await;

        let restored = match (token, user) {
            (Some(_), Some(user)) => Some(user),
            _ => None,
        };

        if let Some(user) = &restored {
            info!("Restored session for {}", user.email);
        }
        *self.user.write().await = restored;
    }

    pub async fn user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please enter both username and password".to_string(),
            ));
        }

        let limiter_key = format!("login:{}", username.to_lowercase());
        if !self.limiter.is_allowed(&limiter_key) {
            warn!("Login throttled for {}", username);
            return Err(AuthError::RateLimited);
        }

        let credentials = LoginCredentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.api.login(&credentials).await.inspect_err(|e| {
            error!(
                "Login failed ({} attempt(s) left): {}",
                self.limiter.remaining_attempts(&limiter_key),
                e
            );
        })?;

        self.limiter.reset(&limiter_key);
        *self.user.write().await = Some(response.user.clone());
        Ok(response.user)
    }

    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        if full_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please fill in all fields".to_string()));
        }
        if !validate_full_name(full_name) {
            return Err(AuthError::Validation(
                "Please enter a valid full name".to_string(),
            ));
        }
        if !validate_email(email) {
            return Err(AuthError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        let check = validate_password(password);
        if !check.is_valid {
            return Err(AuthError::Validation(check.errors.join("\n")));
        }

        let credentials = SignUpCredentials {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = self.api.sign_up(&credentials).await.inspect_err(|e| {
            error!("Sign up failed: {}", e);
        })?;

        *self.user.write().await = Some(response.user.clone());
        Ok(response.user)
    }

    /// Signs in with an already-verified Google identity.
    pub async fn google_login(&self, data: &GoogleLoginData) -> Result<User, AuthError> {
        if !validate_email(&data.email) {
            return Err(AuthError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }

        let response = self.api.google_login(data).await.inspect_err(|e| {
            error!("Google sign in failed: {}", e);
        })?;

        *self.user.write().await = Some(response.user.clone());
        Ok(response.user)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::Validation(
                "Please enter your email address".to_string(),
            ));
        }
        if !validate_email(email) {
            return Err(AuthError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }

        Ok(self.api.forgot_password(email.trim()).await?)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.api.logout().await.inspect_err(|e| {
            error!("Logout failed: {}", e);
        })?;
        *self.user.write().await = None;
        Ok(())
    }

    /// Re-reads the persisted user.
    pub async fn refresh_user(&self) {
        let user = self.api.current_user().await;
        *self.user.write().await = user;
    }

    pub async fn update_profile(&self, updates: ProfileUpdate) -> Result<User, AuthError> {
        if !self.is_authenticated().await {
            return Err(AuthError::NotAuthenticated);
        }

        if let Some(name) = &updates.full_name
            && !validate_full_name(name)
        {
            return Err(AuthError::Validation("Full name is required".to_string()));
        }
        if let Some(email) = &updates.email
            && !validate_email(email)
        {
            return Err(AuthError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        if let Some(username) = &updates.username
            && !validate_username(username)
        {
            return Err(AuthError::Validation(
                "Username must be 3-30 letters, digits, '_' or '-'".to_string(),
            ));
        }

        let user = self.api.update_profile(&updates).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }
}
