use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user id assigned by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed-in user.
///
/// Carries the bearer id token so the remote store can read on the user's
/// behalf. The token is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: UserId,
    pub email: Option<String>,
    id_token: String,
}

impl Identity {
    pub fn new(uid: UserId, email: Option<String>, id_token: impl Into<String>) -> Self {
        Self {
            uid,
            email,
            id_token: id_token.into(),
        }
    }

    /// Bearer token for authenticated document reads
    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    /// Email when known, otherwise the uid
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(self.uid.as_str())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .finish()
    }
}

/// Snapshot of the current authentication state.
///
/// `resolved` flips to true once the startup handshake has finished and
/// never flips back. `identity` is `None` when nobody is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    resolved: bool,
    identity: Option<Identity>,
}

impl Session {
    /// State at process start, before the handshake completes
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn resolved(identity: Option<Identity>) -> Self {
        Self {
            resolved: true,
            identity,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self::resolved(Some(identity))
    }

    pub fn signed_out() -> Self {
        Self::resolved(None)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|i| &i.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_session_has_no_identity() {
        let session = Session::unresolved();
        assert!(!session.is_resolved());
        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn test_signed_in_session_is_resolved() {
        let identity = Identity::new(UserId::new("u1"), None, "token");
        let session = Session::signed_in(identity);
        assert!(session.is_resolved());
        assert!(session.is_authenticated());
        assert_eq!(session.user_id().map(UserId::as_str), Some("u1"));
    }

    #[test]
    fn test_signed_out_session_is_resolved() {
        let session = Session::signed_out();
        assert!(session.is_resolved());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_identity_debug_redacts_token() {
        let identity = Identity::new(UserId::new("u1"), Some("a@b.c".into()), "secret-token");
        let debug = format!("{:?}", identity);
        assert!(debug.contains("u1"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_display_name_prefers_email() {
        let with_email = Identity::new(UserId::new("u1"), Some("u1@example.com".to_string()), "t");
        assert_eq!(with_email.display_name(), "u1@example.com");

        let without_email = Identity::new(UserId::new("u1"), None, "t");
        assert_eq!(without_email.display_name(), "u1");
    }
}
