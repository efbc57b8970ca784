//! Credential session provider.
//!
//! Owns the process-wide `Session`. The startup handshake with the identity
//! backend is the only source of the initial resolution; sign-in and
//! sign-out publish the transitions that follow it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::{AuthError, IdentityBackend, Session, SessionChannel, Subscription};

/// Read access to the session: a point query plus a subscription.
///
/// The navigation guard and the group store depend on this rather than on
/// `SessionProvider` directly.
pub trait SessionSource: Send + Sync {
    /// Best-known session right now; may be unresolved
    fn current_session(&self) -> Session;

    /// Register for every future session transition
    fn subscribe(&self) -> Subscription;
}

pub struct SessionProvider {
    backend: Arc<dyn IdentityBackend>,
    channel: SessionChannel,
    // Serializes transitions so they are published in the order they happen
    transitions: Mutex<()>,
}

impl SessionProvider {
    /// Create a provider in the unresolved state. Nothing talks to the
    /// backend until `handshake` runs.
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        Self {
            backend,
            channel: SessionChannel::new(Session::unresolved()),
            transitions: Mutex::new(()),
        }
    }

    /// Create a provider and spawn its startup handshake on the current runtime
    pub fn start(backend: Arc<dyn IdentityBackend>) -> Arc<Self> {
        let provider = Arc::new(Self::new(backend));
        let task_provider = Arc::clone(&provider);
        tokio::spawn(async move {
            task_provider.handshake().await;
        });
        provider
    }

    /// Run the one-time handshake with the identity backend.
    ///
    /// Later calls wait for the first one and return the resolved session
    /// without contacting the backend again. A failed handshake resolves to
    /// a signed-out session; it is not retried.
    pub async fn handshake(&self) -> Session {
        let _guard = self.transitions.lock().await;

        let current = self.channel.current();
        if current.is_resolved() {
            return current;
        }

        debug!("Starting identity handshake");
        let session = match self.backend.restore().await {
            Ok(identity) => Session::resolved(identity),
            Err(e) => {
                error!(error = %e, "Identity handshake failed, continuing signed out");
                Session::signed_out()
            }
        };

        let delivered = self.channel.publish(session.clone());
        info!(
            authenticated = session.is_authenticated(),
            subscribers = delivered,
            "Session resolved"
        );
        session
    }

    /// Wait until the handshake has resolved the session
    pub async fn wait_resolved(&self) -> Session {
        let mut subscription = self.channel.subscribe();
        if subscription.initial().is_resolved() {
            return subscription.initial().clone();
        }
        while let Some(session) = subscription.next().await {
            if session.is_resolved() {
                return session;
            }
        }
        // The channel lives as long as self, so the loop only ends on resolution
        self.channel.current()
    }

    /// Sign in with email and password.
    ///
    /// Runs the handshake first if it has not happened yet, so the initial
    /// resolution is always the first transition subscribers see. A failed
    /// sign-in leaves the session untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.handshake().await;
        let _guard = self.transitions.lock().await;

        let identity = self.backend.sign_in(email, password).await?;
        let session = Session::signed_in(identity);
        let delivered = self.channel.publish(session.clone());
        info!(uid = ?session.user_id(), subscribers = delivered, "User signed in");
        Ok(session)
    }

    /// Sign out. Publishes a transition only if someone was signed in.
    pub async fn sign_out(&self) -> Result<Session, AuthError> {
        self.handshake().await;
        let _guard = self.transitions.lock().await;

        self.backend.sign_out().await?;

        let current = self.channel.current();
        if !current.is_authenticated() {
            debug!("Sign-out requested while signed out");
            return Ok(current);
        }

        let session = Session::signed_out();
        let delivered = self.channel.publish(session.clone());
        info!(subscribers = delivered, "User signed out");
        Ok(session)
    }
}

impl SessionSource for SessionProvider {
    fn current_session(&self) -> Session {
        self.channel.current()
    }

    fn subscribe(&self) -> Subscription {
        self.channel.subscribe()
    }
}
