use tracing::{info, warn};

use super::{normalize_path, Decision, NavigationGuard, NavigationRequest};

/// Where a navigation ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: String,
    /// View to render; `None` when no route matches the path
    pub view: Option<String>,
    /// Originally requested path when the guard redirected
    pub redirected_from: Option<String>,
}

/// Tracks the current location and runs every navigation through the guard.
///
/// `push` takes `&mut self`, so navigations never overlap. Dropping a
/// pending `push` future cancels it and releases its session subscription.
pub struct Router {
    guard: NavigationGuard,
    current: Option<String>,
}

impl Router {
    pub fn new(guard: NavigationGuard) -> Self {
        Self {
            guard,
            current: None,
        }
    }

    /// Current location; `None` before the first navigation completes
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Navigate to `path`, following a guard redirect to the landing route.
    pub async fn push(&mut self, path: &str) -> Resolved {
        let requested = normalize_path(path);
        let request = NavigationRequest::new(requested.clone(), self.current.clone());

        // The guard only accepts a public landing route, so a redirect lands there directly
        let (target, redirected_from) = match self.guard.check(&request).await {
            Decision::Proceed => (requested, None),
            Decision::Redirect(to) => {
                info!(from = %requested, to = %to, "Navigation redirected");
                (to, Some(requested))
            }
        };

        let view = self.guard.routes().lookup(&target).map(|r| r.view.clone());
        if view.is_none() {
            warn!(path = %target, "No route matches, nothing to render");
        }
        self.current = Some(target.clone());
        Resolved {
            path: target,
            view,
            redirected_from,
        }
    }
}
