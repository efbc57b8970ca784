use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::RouterError;

/// One entry in the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub view: String,
    #[serde(default)]
    pub requires_auth: bool,
}

impl RouteDescriptor {
    /// A route anyone may open
    pub fn public(path: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: view.into(),
            requires_auth: false,
        }
    }

    /// A route that requires a signed-in user
    pub fn protected(path: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            view: view.into(),
            requires_auth: true,
        }
    }
}

/// Static, ordered routing table. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Build a table, normalizing paths and rejecting duplicates
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self, RouterError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(routes.len());

        for mut route in routes {
            if !route.path.trim_start().starts_with('/') {
                return Err(RouterError::InvalidPath(route.path));
            }
            route.path = normalize_path(&route.path);
            if !seen.insert(route.path.clone()) {
                return Err(RouterError::DuplicateRoute(route.path));
            }
            normalized.push(route);
        }

        Ok(Self { routes: normalized })
    }

    /// First route whose path matches `path` after normalization
    pub fn lookup(&self, path: &str) -> Option<&RouteDescriptor> {
        let path = normalize_path(path);
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }
}

impl Default for RouteTable {
    /// Views of the counter app: home, statistics, calendar and settings
    /// need a signed-in user; the sign-in view does not.
    fn default() -> Self {
        Self {
            routes: vec![
                RouteDescriptor::protected("/", "home"),
                RouteDescriptor::protected("/stats", "statistics"),
                RouteDescriptor::protected("/calendar", "calendar"),
                RouteDescriptor::public("/auth", "auth"),
                RouteDescriptor::protected("/settings", "settings"),
            ],
        }
    }
}

/// Canonical form of a location.
///
/// Accepts hash-history locations (`#/stats`), drops the query string and
/// fragment, and removes trailing slashes except on the root.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.strip_prefix('#').unwrap_or(path);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/stats/"), "/stats");
        assert_eq!(normalize_path("#/stats"), "/stats");
        assert_eq!(normalize_path("/stats?range=week"), "/stats");
        assert_eq!(normalize_path("/calendar#today"), "/calendar");
        assert_eq!(normalize_path("settings"), "/settings");
        assert_eq!(normalize_path("  /auth  "), "/auth");
    }

    #[test]
    fn test_default_table() {
        let table = RouteTable::default();
        assert_eq!(table.routes().len(), 5);
        assert!(table.lookup("/").unwrap().requires_auth);
        assert!(table.lookup("/stats").unwrap().requires_auth);
        assert!(table.lookup("/calendar").unwrap().requires_auth);
        assert!(table.lookup("/settings").unwrap().requires_auth);
        assert!(!table.lookup("/auth").unwrap().requires_auth);
    }

    #[test]
    fn test_lookup_normalizes() {
        let table = RouteTable::default();
        assert_eq!(table.lookup("#/stats/?x=1").unwrap().view, "statistics");
        assert!(table.lookup("/missing").is_none());
    }

    #[test]
    fn test_new_rejects_relative_path() {
        let result = RouteTable::new(vec![RouteDescriptor::public("auth", "auth")]);
        assert_eq!(result, Err(RouterError::InvalidPath("auth".into())));
    }

    #[test]
    fn test_new_rejects_duplicates_after_normalization() {
        let result = RouteTable::new(vec![
            RouteDescriptor::public("/auth", "auth"),
            RouteDescriptor::protected("/auth/", "other"),
        ]);
        assert_eq!(result, Err(RouterError::DuplicateRoute("/auth".into())));
    }

    #[test]
    fn test_descriptor_defaults_to_public() {
        let route: RouteDescriptor = serde_json::from_str(r#"{"path":"/about","view":"about"}"#).unwrap();
        assert!(!route.requires_auth);
    }
}
