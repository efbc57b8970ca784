//! In-app navigation.
//!
//! This module provides:
//! - `RouteTable`: the static, ordered list of route descriptors
//! - `NavigationGuard`: decides whether a navigation may proceed, suspending
//!   until the session is resolved when the target requires sign-in
//! - `Router`: tracks the current location and follows guard redirects
//!
//! Protection is one-sided: signed-out users are redirected away from
//! protected routes, but signed-in users may still open public routes such
//! as the sign-in view.

pub mod error;
pub mod guard;
pub mod navigator;
pub mod routes;

pub use error::RouterError;
pub use guard::{Decision, GuardState, NavigationGuard, NavigationRequest};
pub use navigator::{Resolved, Router};
pub use routes::{normalize_path, RouteDescriptor, RouteTable};
