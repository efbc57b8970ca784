//! Remote document store port.

use async_trait::async_trait;
use serde_json::Value;

use super::StoreError;
use crate::auth::Identity;

/// Point-read access to per-user documents.
///
/// # Contract
///
/// Implementations must:
/// - Return `Ok(Some(contents))` with the document decoded to plain JSON
/// - Return `Ok(None)` when the user has no document
/// - Return `Err(StoreError)` for transport or backend failures, without retrying
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document belonging to `identity`.
    async fn read_user_document(&self, identity: &Identity) -> Result<Option<Value>, StoreError>;
}
