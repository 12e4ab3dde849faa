//! Application configuration

use crate::command::CommandId;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub viewer: ViewerConfig,
    pub search: SearchConfig,
    pub keybindings: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            viewer: ViewerConfig::default(),
            search: SearchConfig::default(),
            keybindings: default_keybindings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Rotated log files older than this are removed at startup
    pub log_retention_days: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_retention_days: 7,
        }
    }
}

/// Viewer behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Manifest locator (URL) fetched when the viewer is mounted
    pub manifest: Option<String>,
    /// How long a pending page may wait for its image before giving up
    pub load_timeout_ms: u64,
    /// Pending/retry cycles allowed for a single show request
    pub max_show_attempts: u32,
    /// Start loading every page in the background after the first one shows
    pub preload: bool,
    /// HTTP request timeout for manifest and image fetches
    pub request_timeout_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            load_timeout_ms: 30_000,
            max_show_attempts: 8,
            preload: true,
            request_timeout_ms: 15_000,
        }
    }
}

impl ViewerConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Row count used when the form carries a negative value
    pub default_rows: u32,
    /// Upper bound for the row count
    pub max_rows: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_rows: 10,
            max_rows: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("org", "IIIFMangaViewer", "MangaViewer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}

fn default_keybindings() -> HashMap<String, Vec<String>> {
    let mut kb = HashMap::new();

    // Right-to-left reading: "left" turns the page forward.
    kb.insert(CommandId::NAV_NEXT.into(), vec!["n".into(), "left".into(), "space".into()]);
    kb.insert(CommandId::NAV_PREV.into(), vec!["p".into(), "right".into()]);
    kb.insert(CommandId::NAV_GOTO.into(), vec!["g".into(), "goto".into()]);
    kb.insert(CommandId::NAV_FIRST.into(), vec!["home".into()]);
    kb.insert(CommandId::NAV_LAST.into(), vec!["end".into()]);

    kb.insert(CommandId::VIEW_TOGGLE_LIST.into(), vec!["list".into(), "l".into()]);
    kb.insert(CommandId::VIEW_TOGGLE_GRID.into(), vec!["grid".into(), "i".into()]);
    kb.insert(CommandId::VIEW_TOGGLE_SEARCH.into(), vec!["/".into()]);

    kb.insert(CommandId::POINTER_CLICK.into(), vec!["click".into(), "c".into()]);
    kb.insert(CommandId::ENTRY_CLICK.into(), vec!["pick".into()]);

    kb.insert(CommandId::APP_SEARCH.into(), vec!["search".into(), "s".into()]);
    kb.insert(CommandId::APP_STATUS.into(), vec!["status".into(), "?".into()]);
    kb.insert(CommandId::APP_QUIT.into(), vec!["quit".into(), "q".into()]);

    kb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.viewer.load_timeout(), Duration::from_secs(30));
        assert_eq!(config.viewer.max_show_attempts, 8);
        assert_eq!(config.search.default_rows, 10);
        assert!(config.keybindings.contains_key(CommandId::NAV_NEXT));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[viewer]\nmanifest = \"https://example.org/iiif/manifest.json\"\nload_timeout_ms = 500"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(
            config.viewer.manifest.as_deref(),
            Some("https://example.org/iiif/manifest.json")
        );
        assert_eq!(config.viewer.load_timeout(), Duration::from_millis(500));
        assert!(config.viewer.preload);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.viewer.manifest.is_none());
    }
}
