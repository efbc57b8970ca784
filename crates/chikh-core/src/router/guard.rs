//! Authentication-gated navigation guard.
//!
//! Each navigation moves through `Pending`, optionally `Resolving`, and ends
//! in `Allowed` or `Redirected`. `check` returns the single decision for the
//! request, so the continuation runs exactly once by construction.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{normalize_path, RouteTable, RouterError};
use crate::auth::{Session, SessionSource};

/// Per-navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Resolving,
    Allowed,
    Redirected,
}

/// A navigation attempt from `previous` to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub target: String,
    pub previous: Option<String>,
}

impl NavigationRequest {
    pub fn new(target: impl Into<String>, previous: Option<String>) -> Self {
        Self {
            target: target.into(),
            previous,
        }
    }
}

/// Outcome of a guarded navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(String),
}

impl Decision {
    /// Terminal guard state this decision corresponds to
    pub fn state(&self) -> GuardState {
        match self {
            Decision::Proceed => GuardState::Allowed,
            Decision::Redirect(_) => GuardState::Redirected,
        }
    }
}

pub struct NavigationGuard {
    routes: Arc<RouteTable>,
    session: Arc<dyn SessionSource>,
    landing_route: String,
    resolve_timeout: Option<Duration>,
}

impl NavigationGuard {
    /// Create a guard that sends signed-out users to `landing_route`.
    ///
    /// The landing route must exist and must not itself require sign-in.
    pub fn new(
        routes: Arc<RouteTable>,
        session: Arc<dyn SessionSource>,
        landing_route: &str,
    ) -> Result<Self, RouterError> {
        let landing = routes
            .lookup(landing_route)
            .ok_or_else(|| RouterError::UnknownLandingRoute(landing_route.to_string()))?;
        if landing.requires_auth {
            return Err(RouterError::ProtectedLandingRoute(landing.path.clone()));
        }
        let landing_route = landing.path.clone();

        Ok(Self {
            routes,
            session,
            landing_route,
            resolve_timeout: None,
        })
    }

    /// Give up waiting for the session after `timeout` and treat the user as
    /// signed out. Without a timeout a navigation waits as long as the
    /// handshake takes.
    pub fn with_resolve_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn landing_route(&self) -> &str {
        &self.landing_route
    }

    /// Decide whether `request` may proceed.
    ///
    /// Public routes (and paths with no route) proceed without looking at
    /// the session. Protected routes proceed for a signed-in user, redirect
    /// a known signed-out user, and otherwise wait for exactly one session
    /// transition before deciding.
    pub async fn check(&self, request: &NavigationRequest) -> Decision {
        let target = normalize_path(&request.target);
        debug!(
            target = %target,
            previous = ?request.previous,
            state = ?GuardState::Pending,
            "Navigation requested"
        );

        let requires_auth = self
            .routes
            .lookup(&target)
            .map(|route| route.requires_auth)
            .unwrap_or(false);
        if !requires_auth {
            return self.finish(&target, Decision::Proceed);
        }

        let session = self.session.current_session();
        if session.is_authenticated() {
            return self.finish(&target, Decision::Proceed);
        }
        if session.is_resolved() {
            return self.finish(&target, self.redirect());
        }

        debug!(target = %target, state = ?GuardState::Resolving, "Waiting for session");
        let decision = match self.resolve().await {
            Some(session) if session.is_authenticated() => Decision::Proceed,
            _ => self.redirect(),
        };
        self.finish(&target, decision)
    }

    /// Wait for one session transition, then tear the subscription down.
    async fn resolve(&self) -> Option<Session> {
        let mut subscription = self.session.subscribe();

        // A transition that landed between the point query and the
        // subscription is the one we were waiting for.
        if subscription.initial().is_resolved() {
            return Some(subscription.initial().clone());
        }

        let next = match self.resolve_timeout {
            Some(limit) => match tokio::time::timeout(limit, subscription.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(timeout = ?limit, "Session still unresolved, treating as signed out");
                    None
                }
            },
            None => subscription.next().await,
        };
        subscription.unsubscribe();

        if next.is_none() {
            warn!("Session channel closed before resolution");
        }
        next
    }

    fn redirect(&self) -> Decision {
        Decision::Redirect(self.landing_route.clone())
    }

    fn finish(&self, target: &str, decision: Decision) -> Decision {
        debug!(target = %target, state = ?decision.state(), "Navigation decided");
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, SessionChannel, Subscription, UserId};
    use crate::router::RouteDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Session source that counts how often it is consulted
    struct CountingSource {
        channel: SessionChannel,
        queries: AtomicUsize,
        subscriptions: AtomicUsize,
    }

    impl CountingSource {
        fn new(initial: Session) -> Arc<Self> {
            let channel = SessionChannel::new(Session::unresolved());
            if initial.is_resolved() {
                channel.publish(initial);
            }
            Arc::new(Self {
                channel,
                queries: AtomicUsize::new(0),
                subscriptions: AtomicUsize::new(0),
            })
        }

        fn consulted(&self) -> usize {
            self.queries.load(Ordering::SeqCst) + self.subscriptions.load(Ordering::SeqCst)
        }
    }

    impl SessionSource for CountingSource {
        fn current_session(&self) -> Session {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.channel.current()
        }

        fn subscribe(&self) -> Subscription {
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            self.channel.subscribe()
        }
    }

    fn signed_in(uid: &str) -> Session {
        Session::signed_in(Identity::new(UserId::new(uid), None, "token"))
    }

    fn guard(source: &Arc<CountingSource>) -> NavigationGuard {
        NavigationGuard::new(Arc::new(RouteTable::default()), source.clone(), "/auth").unwrap()
    }

    fn request(target: &str) -> NavigationRequest {
        NavigationRequest::new(target, Some("/".to_string()))
    }

    async fn wait_for_subscriber(source: &CountingSource) {
        while source.channel.subscriber_count() == 0 {
            tokio::task::yield_now().await;
        }
    }

    // -------------------------------------------------------------------------
    // Construction Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_unknown_landing_route_rejected() {
        let source = CountingSource::new(Session::unresolved());
        let result = NavigationGuard::new(Arc::new(RouteTable::default()), source, "/login");
        assert!(matches!(result, Err(RouterError::UnknownLandingRoute(_))));
    }

    #[test]
    fn test_protected_landing_route_rejected() {
        let source = CountingSource::new(Session::unresolved());
        let result = NavigationGuard::new(Arc::new(RouteTable::default()), source, "/settings");
        assert!(matches!(result, Err(RouterError::ProtectedLandingRoute(_))));
    }

    // -------------------------------------------------------------------------
    // Decision Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_public_route_never_consults_session() {
        for initial in [Session::unresolved(), Session::signed_out(), signed_in("u1")] {
            let source = CountingSource::new(initial);
            let guard = guard(&source);

            assert_eq!(guard.check(&request("/auth")).await, Decision::Proceed);
            assert_eq!(guard.check(&request("/no-such-view")).await, Decision::Proceed);
            assert_eq!(source.consulted(), 0);
        }
    }

    #[tokio::test]
    async fn test_custom_public_route_allowed() {
        let source = CountingSource::new(Session::unresolved());
        let table = RouteTable::new(vec![
            RouteDescriptor::public("/welcome", "welcome"),
            RouteDescriptor::protected("/", "home"),
        ])
        .unwrap();
        let guard = NavigationGuard::new(Arc::new(table), source.clone(), "/welcome").unwrap();

        assert_eq!(guard.check(&request("/welcome")).await, Decision::Proceed);
        assert_eq!(source.consulted(), 0);
    }

    #[tokio::test]
    async fn test_protected_route_signed_in_allowed() {
        let source = CountingSource::new(signed_in("u1"));
        let guard = guard(&source);

        for path in ["/", "/stats", "/calendar", "/settings"] {
            assert_eq!(guard.check(&request(path)).await, Decision::Proceed);
        }
        assert_eq!(source.subscriptions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_protected_route_signed_out_redirected() {
        let source = CountingSource::new(Session::signed_out());
        let guard = guard(&source);

        let decision = guard.check(&request("/stats")).await;
        assert_eq!(decision, Decision::Redirect("/auth".to_string()));
        assert_eq!(decision.state(), GuardState::Redirected);
        assert_eq!(source.subscriptions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signed_in_user_may_open_auth_view() {
        let source = CountingSource::new(signed_in("u1"));
        let guard = guard(&source);
        assert_eq!(guard.check(&request("/auth")).await, Decision::Proceed);
    }

    // -------------------------------------------------------------------------
    // Resolving Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_unresolved_waits_then_allows() {
        let source = CountingSource::new(Session::unresolved());
        let guard = Arc::new(guard(&source));

        let task_guard = guard.clone();
        let pending = tokio::spawn(async move { task_guard.check(&request("/")).await });

        wait_for_subscriber(&source).await;
        assert!(!pending.is_finished());

        source.channel.publish(signed_in("u1"));
        assert_eq!(pending.await.unwrap(), Decision::Proceed);
        assert_eq!(source.channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_unresolved_waits_then_redirects() {
        let source = CountingSource::new(Session::unresolved());
        let guard = Arc::new(guard(&source));

        let task_guard = guard.clone();
        let pending = tokio::spawn(async move { task_guard.check(&request("/settings")).await });

        wait_for_subscriber(&source).await;
        source.channel.publish(Session::signed_out());

        assert_eq!(pending.await.unwrap(), Decision::Redirect("/auth".to_string()));
    }

    #[tokio::test]
    async fn test_resolves_on_first_event_only() {
        let source = CountingSource::new(Session::unresolved());
        let guard = Arc::new(guard(&source));

        let task_guard = guard.clone();
        let pending = tokio::spawn(async move { task_guard.check(&request("/calendar")).await });

        wait_for_subscriber(&source).await;
        // Burst of transitions: only the first one decides
        source.channel.publish(signed_in("u1"));
        source.channel.publish(Session::signed_out());
        source.channel.publish(signed_in("u2"));

        assert_eq!(pending.await.unwrap(), Decision::Proceed);
        assert_eq!(source.subscriptions.load(Ordering::SeqCst), 1);
        assert_eq!(source.channel.subscriber_count(), 0);
        assert_eq!(source.channel.publish(Session::signed_out()), 0);
    }

    #[tokio::test]
    async fn test_resolve_timeout_redirects() {
        let source = CountingSource::new(Session::unresolved());
        let guard = guard(&source).with_resolve_timeout(Some(Duration::from_millis(20)));

        let decision = guard.check(&request("/")).await;
        assert_eq!(decision, Decision::Redirect("/auth".to_string()));
        assert_eq!(source.channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_navigation_releases_subscription() {
        let source = CountingSource::new(Session::unresolved());
        let guard = Arc::new(guard(&source));

        let task_guard = guard.clone();
        let pending = tokio::spawn(async move { task_guard.check(&request("/")).await });
        wait_for_subscriber(&source).await;

        pending.abort();
        let _ = pending.await;
        assert_eq!(source.channel.subscriber_count(), 0);
    }
}
