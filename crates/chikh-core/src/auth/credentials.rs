use keyring::Entry;

use super::{AuthError, UserId};

const SERVICE_NAME: &str = "chikh-counter";

/// Storage for the long-lived refresh token of a signed-in user.
pub trait TokenStore: Send + Sync {
    fn store_refresh_token(&self, uid: &UserId, token: &str) -> Result<(), AuthError>;

    fn refresh_token(&self, uid: &UserId) -> Result<String, AuthError>;

    /// Removes the stored token. A missing entry is not an error.
    fn delete(&self, uid: &UserId) -> Result<(), AuthError>;
}

/// Refresh tokens live in the OS keychain, keyed by user id.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(uid: &UserId) -> Result<Entry, AuthError> {
        Entry::new(SERVICE_NAME, uid.as_str())
            .map_err(|e| AuthError::Storage(format!("Failed to create keyring entry: {}", e)))
    }
}

impl TokenStore for CredentialStore {
    /// Store the refresh token for a user in the OS keychain
    fn store_refresh_token(&self, uid: &UserId, token: &str) -> Result<(), AuthError> {
        Self::entry(uid)?
            .set_password(token)
            .map_err(|e| AuthError::Storage(format!("Failed to store token in keychain: {}", e)))
    }

    /// Retrieve the refresh token for a user from the OS keychain
    fn refresh_token(&self, uid: &UserId) -> Result<String, AuthError> {
        Self::entry(uid)?
            .get_password()
            .map_err(|e| AuthError::Storage(format!("Failed to retrieve token from keychain: {}", e)))
    }

    fn delete(&self, uid: &UserId) -> Result<(), AuthError> {
        match Self::entry(uid)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::Storage(format!(
                "Failed to delete credential from keychain: {}",
                e
            ))),
        }
    }
}
