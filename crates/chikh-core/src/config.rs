//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! Firebase project settings, the navigation landing route and resolve
//! timeout, an optional routing table override, the last used sign-in email
//! and the color preferences.
//!
//! Configuration is stored at `~/.config/chikh-counter/config.json`.
//! `CHIKH_API_KEY` and `CHIKH_PROJECT_ID` override the Firebase settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::router::{RouteDescriptor, RouteTable};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "chikh-counter";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const API_KEY_ENV: &str = "CHIKH_API_KEY";
const PROJECT_ID_ENV: &str = "CHIKH_PROJECT_ID";

const DEFAULT_PROJECT_ID: &str = "chikh-counter";
const DEFAULT_LANDING_ROUTE: &str = "/auth";

pub const DEFAULT_COLOR_PRIMARY: &str = "#2F5249";
pub const DEFAULT_COLOR_ACCENT: &str = "#E3DE61";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub landing_route: Option<String>,
    pub resolve_timeout_secs: Option<u64>,
    pub routes: Option<Vec<RouteDescriptor>>,
    pub last_email: Option<String>,
    pub color_primary: Option<String>,
    pub color_accent: Option<String>,
}

/// Effective UI colors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorScheme {
    pub primary: String,
    pub accent: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persisted session and logs
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Firebase web API key. There is no built-in default.
    pub fn api_key(&self) -> Result<String> {
        setting(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
            .ok_or_else(|| anyhow::anyhow!("Firebase API key not configured; set {} or api_key in config.json", API_KEY_ENV))
    }

    pub fn project_id(&self) -> String {
        setting(std::env::var(PROJECT_ID_ENV).ok(), self.project_id.as_deref())
            .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string())
    }

    pub fn landing_route(&self) -> &str {
        self.landing_route.as_deref().unwrap_or(DEFAULT_LANDING_ROUTE)
    }

    /// How long a navigation waits for the session; `None` waits forever
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_secs.map(Duration::from_secs)
    }

    /// Routing table from config, or the built-in one
    pub fn route_table(&self) -> Result<RouteTable> {
        match &self.routes {
            Some(routes) => RouteTable::new(routes.clone()).context("Invalid routes in config"),
            None => Ok(RouteTable::default()),
        }
    }

    /// Stored colors, falling back to the defaults for missing or invalid values
    pub fn colors(&self) -> ColorScheme {
        ColorScheme {
            primary: color_or_default("color_primary", self.color_primary.as_deref(), DEFAULT_COLOR_PRIMARY),
            accent: color_or_default("color_accent", self.color_accent.as_deref(), DEFAULT_COLOR_ACCENT),
        }
    }
}

/// Environment value first, then the config file, ignoring blank values
fn setting(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| file.filter(|v| !v.trim().is_empty()).map(str::to_string))
}

fn color_or_default(name: &str, value: Option<&str>, default: &str) -> String {
    match value {
        Some(color) if is_hex_color(color) => color.to_string(),
        Some(color) => {
            warn!(setting = name, value = color, "Invalid color, using default");
            default.to_string()
        }
        None => default.to_string(),
    }
}

/// `#RGB` or `#RRGGBB`
fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.landing_route(), "/auth");
        assert_eq!(config.resolve_timeout(), None);
        assert_eq!(config.route_table().unwrap(), RouteTable::default());
        assert_eq!(
            config.colors(),
            ColorScheme {
                primary: "#2F5249".into(),
                accent: "#E3DE61".into(),
            }
        );
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = serde_json::from_str(
            r##"{"project_id":"other","resolve_timeout_secs":15,"color_accent":"#fff"}"##,
        )
        .unwrap();
        assert_eq!(config.resolve_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.colors().accent, "#fff");
        assert_eq!(config.colors().primary, DEFAULT_COLOR_PRIMARY);
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let config = Config {
            color_primary: Some("green".into()),
            color_accent: Some("#12345G".into()),
            ..Default::default()
        };
        assert_eq!(config.colors().primary, DEFAULT_COLOR_PRIMARY);
        assert_eq!(config.colors().accent, DEFAULT_COLOR_ACCENT);
    }

    #[test]
    fn test_setting_precedence() {
        assert_eq!(setting(Some("env".into()), Some("file")), Some("env".into()));
        assert_eq!(setting(None, Some("file")), Some("file".into()));
        assert_eq!(setting(Some("  ".into()), Some("file")), Some("file".into()));
        assert_eq!(setting(None, Some("")), None);
        assert_eq!(setting(None, None), None);
    }

    #[test]
    fn test_route_override() {
        let config = Config {
            routes: Some(vec![
                RouteDescriptor::public("/login", "auth"),
                RouteDescriptor::protected("/", "home"),
            ]),
            landing_route: Some("/login".into()),
            ..Default::default()
        };
        let table = config.route_table().unwrap();
        assert_eq!(table.routes().len(), 2);
        assert!(table.lookup("/login").is_some());
    }

    #[test]
    fn test_route_override_invalid() {
        let config = Config {
            routes: Some(vec![RouteDescriptor::public("login", "auth")]),
            ..Default::default()
        };
        assert!(config.route_table().is_err());
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#2F5249"));
        assert!(is_hex_color("#abc"));
        assert!(!is_hex_color("2F5249"));
        assert!(!is_hex_color("#2F52"));
        assert!(!is_hex_color("#zzzzzz"));
    }

    #[test]
    fn test_cache_dir_is_per_app() {
        // Hosts with no home directory have no cache dir at all
        if let Ok(dir) = Config::cache_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
