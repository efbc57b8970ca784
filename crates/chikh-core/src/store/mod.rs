//! Remote group store.
//!
//! This module provides the `GroupStore` for reading the signed-in user's
//! group memberships from their per-user document, and the `DocumentStore`
//! seam it reads through, with a Firestore REST implementation.
//!
//! Nothing is cached locally; the remote document is the single source of
//! truth and every call performs a fresh read.

pub mod document;
pub mod error;
pub mod firestore;
pub mod groups;

pub use document::DocumentStore;
pub use error::StoreError;
pub use firestore::FirestoreClient;
pub use groups::{GroupMembershipMap, GroupMetadata, GroupStore};
