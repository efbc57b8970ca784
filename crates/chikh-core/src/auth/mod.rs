//! Authentication module for the credential session provider.
//!
//! This module provides:
//! - `Session` / `Identity`: the process's knowledge of who is signed in
//! - `SessionChannel` / `Subscription`: ordered publish/subscribe of session transitions
//! - `SessionProvider`: owns the session, runs the startup handshake, signs in and out
//! - `IdentityBackend`: the seam to the identity service, with a Firebase REST implementation
//! - `TokenStore` / `CredentialStore`: refresh token storage, backed by the OS keychain
//!
//! The session starts unresolved and becomes resolved exactly once, when the
//! startup handshake with the identity backend completes.

pub mod backend;
pub mod channel;
pub mod credentials;
pub mod error;
pub mod firebase;
pub mod provider;
pub mod session;
pub mod storage;

pub use backend::IdentityBackend;
pub use channel::{SessionChannel, Subscription};
pub use credentials::{CredentialStore, TokenStore};
pub use error::AuthError;
pub use firebase::FirebaseAuth;
pub use provider::{SessionProvider, SessionSource};
pub use session::{Identity, Session, UserId};
pub use storage::{SessionFile, StoredUser};
