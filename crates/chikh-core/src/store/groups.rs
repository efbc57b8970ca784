use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{DocumentStore, StoreError};
use crate::auth::SessionSource;

/// Field of the user document that holds group memberships
const GROUPS_FIELD: &str = "groups";

/// Metadata for one shared counter group.
///
/// Fields the app does not know about are kept in `extra` so the map
/// returned to callers matches the remote document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Group id to group metadata
pub type GroupMembershipMap = BTreeMap<String, GroupMetadata>;

/// Reads the signed-in user's group memberships.
///
/// Takes the identity from the session itself; callers never pass one in.
pub struct GroupStore {
    session: Arc<dyn SessionSource>,
    documents: Arc<dyn DocumentStore>,
}

impl GroupStore {
    pub fn new(session: Arc<dyn SessionSource>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { session, documents }
    }

    /// Fetch the current user's groups with a single fresh read.
    ///
    /// Anonymous callers get an empty map without any remote call. A missing
    /// document, or a missing or malformed `groups` field, also yields an
    /// empty map. Read failures are returned as-is.
    pub async fn fetch_groups_for_current_user(&self) -> Result<GroupMembershipMap, StoreError> {
        let session = self.session.current_session();
        let Some(identity) = session.identity() else {
            debug!("No signed-in user, no groups");
            return Ok(GroupMembershipMap::new());
        };

        let Some(document) = self.documents.read_user_document(identity).await? else {
            debug!(uid = %identity.uid, "No user document, no groups");
            return Ok(GroupMembershipMap::new());
        };

        let groups = parse_groups(&document);
        debug!(uid = %identity.uid, count = groups.len(), "Groups fetched");
        Ok(groups)
    }
}

fn parse_groups(document: &Value) -> GroupMembershipMap {
    let Some(raw) = document.get(GROUPS_FIELD) else {
        return GroupMembershipMap::new();
    };
    match GroupMembershipMap::deserialize(raw) {
        Ok(groups) => groups,
        Err(e) => {
            warn!(error = %e, "Malformed groups field, treating as empty");
            GroupMembershipMap::new()
        }
    }
}
