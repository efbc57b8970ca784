//! Identity backend for the Firebase Auth REST API.
//!
//! Email/password sign-in goes through the Identity Toolkit endpoint; the
//! startup handshake exchanges the stored refresh token for a fresh id token
//! through the Secure Token endpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AuthError, Identity, IdentityBackend, SessionFile, StoredUser, TokenStore, UserId};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for password sign-in
const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Base URL for refresh-token exchange
const TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshTokenResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
}

/// Firebase Auth client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: Client,
    api_key: String,
    cache_dir: PathBuf,
    tokens: Arc<dyn TokenStore>,
}

impl FirebaseAuth {
    pub fn new(
        api_key: impl Into<String>,
        cache_dir: PathBuf,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            cache_dir,
            tokens,
        })
    }

    fn session_file(&self) -> SessionFile {
        SessionFile::new(self.cache_dir.clone())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_status(status, &body))
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<RefreshTokenResponse, AuthError> {
        let url = format!("{}/token?key={}", TOKEN_BASE_URL, self.api_key);

        let response = self
            .client
            .post(&url)
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))
    }

    fn persist(&self, user: &StoredUser, refresh_token: &str) -> Result<(), AuthError> {
        self.session_file()
            .save(user)
            .map_err(|e| AuthError::Storage(format!("{:#}", e)))?;
        self.tokens.store_refresh_token(&user.uid, refresh_token)
    }
}

#[async_trait]
impl IdentityBackend for FirebaseAuth {
    async fn restore(&self) -> Result<Option<Identity>, AuthError> {
        let stored = self
            .session_file()
            .load()
            .map_err(|e| AuthError::HandshakeFailure(format!("{:#}", e)))?;

        let Some(user) = stored else {
            debug!("No stored session, nobody signed in");
            return Ok(None);
        };
        debug!(uid = %user.uid, age_days = user.age_days(), "Restoring stored session");

        let refresh_token = self
            .tokens
            .refresh_token(&user.uid)
            .map_err(|e| AuthError::HandshakeFailure(e.to_string()))?;
        let tokens = self.exchange_refresh_token(&refresh_token).await?;

        if tokens.user_id != user.uid.as_str() {
            return Err(AuthError::HandshakeFailure(format!(
                "Refresh token belongs to {}, expected {}",
                tokens.user_id, user.uid
            )));
        }

        // Refresh tokens may rotate on exchange
        if let Err(e) = self.tokens.store_refresh_token(&user.uid, &tokens.refresh_token) {
            warn!(error = %e, "Failed to store rotated refresh token");
        }

        Ok(Some(Identity::new(user.uid, user.email, tokens.id_token)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/accounts:signInWithPassword?key={}", IDENTITY_BASE_URL, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&PasswordSignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let auth: PasswordSignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse sign-in response: {}", e)))?;

        let uid = UserId::new(auth.local_id);
        let email = auth.email.or_else(|| Some(email.to_string()));
        self.persist(&StoredUser::new(uid.clone(), email.clone()), &auth.refresh_token)?;

        info!(uid = %uid, "Signed in with password");
        Ok(Identity::new(uid, email, auth.id_token))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let file = self.session_file();
        let stored = file.load().map_err(|e| AuthError::Storage(format!("{:#}", e)))?;
        if let Some(user) = stored {
            self.tokens.delete(&user.uid)?;
        }
        file.clear().map_err(|e| AuthError::Storage(format!("{:#}", e)))?;
        Ok(())
    }
}
