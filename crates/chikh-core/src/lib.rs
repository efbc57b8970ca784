//! Chikh Counter core library.
//!
//! This crate holds the parts of the counter app with real control flow:
//! - `auth`: the credential session provider and its publish/subscribe channel
//! - `router`: the routing table and the authentication-gated navigation guard
//! - `store`: the remote group store backed by Firestore
//! - `config`: on-disk configuration and color preferences
//!
//! View rendering is left to the front end; it talks to this crate through
//! `Router::push`, `GroupStore::fetch_groups_for_current_user` and the
//! `SessionProvider` sign-in/sign-out calls.

pub mod auth;
pub mod config;
pub mod router;
pub mod store;

pub use auth::{Identity, Session, SessionProvider, SessionSource, Subscription, UserId};
pub use config::Config;
pub use router::{Decision, NavigationGuard, NavigationRequest, RouteDescriptor, RouteTable, Router};
pub use store::{GroupMembershipMap, GroupMetadata, GroupStore};
