//! Identity backend port.
//!
//! The session provider is the only consumer of this trait. `restore` is
//! the startup handshake; `sign_in` and `sign_out` produce the user-changed
//! events that follow it.

use async_trait::async_trait;

use super::{AuthError, Identity};

/// Identity service used by `SessionProvider`.
///
/// # Contract
///
/// Implementations must:
/// - Return `Ok(None)` from `restore` when no user was previously signed in
/// - Return `Err(AuthError::HandshakeFailure)` (or a transport error) when the
///   previous sign-in cannot be verified
/// - Forget any persisted credentials in `sign_out`
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Recover the previously signed-in user, if any.
    async fn restore(&self) -> Result<Option<Identity>, AuthError>;

    /// Exchange email and password for a signed-in identity.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Forget the signed-in user.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
