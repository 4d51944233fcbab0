//! Account API client.
//!
//! The bearer token and the signed-in user are persisted so a restart keeps
//! the session.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::error::{ClientError, ensure_success};
use crate::config::AuthConfig;
use crate::constants::storage_keys::{AUTH_TOKEN, AUTH_USER};
use crate::models::{
    AuthResponse, GoogleLoginData, LoginCredentials, ProfileUpdate, SignUpCredentials, User,
};
use crate::storage::KeyValueStore;

const SERVICE: &str = "Auth API";

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

/// Remote account operations, separated from [`AuthClient`] so the session
/// layer can run against a fake.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Loads the persisted token into memory.
    async fn initialize(&self);

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ClientError>;

    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<AuthResponse, ClientError>;

    async fn google_login(&self, data: &GoogleLoginData) -> Result<AuthResponse, ClientError>;

    /// Returns the confirmation message from the server.
    async fn forgot_password(&self, email: &str) -> Result<String, ClientError>;

    /// Clears local credentials; the remote logout call is best effort.
    async fn logout(&self) -> Result<(), ClientError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthResponse, ClientError>;

    async fn update_profile(&self, updates: &ProfileUpdate) -> Result<User, ClientError>;

    async fn current_user(&self) -> Option<User>;

    async fn token(&self) -> Option<String>;

    async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }
}

pub struct AuthClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    store: Arc<dyn KeyValueStore>,
}

impl AuthClient {
    pub fn new(config: &AuthConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            ClientError::NotConfigured(
                "Auth API URL is not configured. Set auth.base_url or SAFECHEM_API_URL."
                    .to_string(),
            )
        })?;
        let client =
            super::build_http_client(Duration::from_secs(config.request_timeout_seconds))?;
        Ok(Self::with_client(client, base_url, store))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = ensure_success(SERVICE, request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn store_auth_data(&self, auth: &AuthResponse) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(&auth.user).map_err(|e| {
            ClientError::Storage(format!("Failed to save authentication data: {e}"))
        })?;

        self.store
            .multi_set(&[(AUTH_TOKEN, auth.token.clone()), (AUTH_USER, user_json)])
            .await
            .map_err(|e| {
                error!("Failed to store auth data: {}", e);
                ClientError::Storage("Failed to save authentication data".to_string())
            })?;

        *self.token.write().await = Some(auth.token.clone());
        Ok(())
    }

    async fn authenticate<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ClientError> {
        let request = self.client.post(self.url(path)).json(body);
        let auth: AuthResponse = self.send_json(request).await?;
        self.store_auth_data(&auth).await?;
        Ok(auth)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn initialize(&self) {
        match self.store.get(AUTH_TOKEN).await {
            Ok(token) => *self.token.write().await = token,
            Err(e) => error!("Failed to load token: {}", e),
        }
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ClientError> {
        debug!("Logging in as {}", credentials.username);
        self.authenticate("/auth/login", credentials).await
    }

    async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<AuthResponse, ClientError> {
        debug!("Signing up {}", credentials.email);
        self.authenticate("/auth/signup", credentials).await
    }

    async fn google_login(&self, data: &GoogleLoginData) -> Result<AuthResponse, ClientError> {
        self.authenticate("/auth/google", data).await
    }

    async fn forgot_password(&self, email: &str) -> Result<String, ClientError> {
        let request = self
            .client
            .post(self.url("/auth/forgot-password"))
            .json(&serde_json::json!({ "email": email }));
        let body: MessageResponse = self.send_json(request).await?;
        Ok(body.message)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        if self.token.read().await.is_some() {
            let request = self.authorized(self.client.post(self.url("/auth/logout"))).await;
            if let Err(e) = request.send().await {
                warn!("Logout request failed, clearing local session anyway: {}", e);
            }
        }

        self.store
            .multi_remove(&[AUTH_TOKEN, AUTH_USER])
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        *self.token.write().await = None;
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthResponse, ClientError> {
        self.authenticate(
            "/auth/refresh",
            &serde_json::json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    async fn update_profile(&self, updates: &ProfileUpdate) -> Result<User, ClientError> {
        let request = self
            .authorized(self.client.patch(self.url("/auth/profile")).json(updates))
            .await;
        let user: User = self.send_json(request).await?;

        let user_json =
            serde_json::to_string(&user).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store
            .set(AUTH_USER, &user_json)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        Ok(user)
    }

    async fn current_user(&self) -> Option<User> {
        match self.store.get(AUTH_USER).await {
            Ok(Some(json)) => serde_json::from_str(&json)
                .map_err(|e| warn!("Stored user is unreadable: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                error!("Failed to get current user: {}", e);
                None
            }
        }
    }

    async fn token(&self) -> Option<String> {
        match self.store.get(AUTH_TOKEN).await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to get token: {}", e);
                None
            }
        }
    }
}
