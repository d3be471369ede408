use crate::auth::AuthStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides [`Settings::portal_settings_path`].
pub const PORTAL_SETTINGS_ENV: &str = "PORTAL_SETTINGS_PATH";

/// Application configuration, stored in `settings.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Where the portal settings document lives.
    #[serde(default = "default_portal_settings_path")]
    pub portal_settings_path: String,
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file receiving log output instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Answer given by the built-in auth provider.
    #[serde(default = "default_auth")]
    pub auth: AuthStatus,
    /// Last known window size. If absent, a default size is used.
    #[serde(default)]
    pub window_size: Option<(i32, i32)>,
    /// Open the dashboard with drag reordering enabled.
    #[serde(default)]
    pub start_in_edit_mode: bool,
}

fn default_portal_settings_path() -> String {
    "portal_settings.json".into()
}

fn default_auth() -> AuthStatus {
    AuthStatus::APPROVED
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            portal_settings_path: default_portal_settings_path(),
            debug_logging: false,
            log_file: None,
            auth: default_auth(),
            window_size: Some((1280, 800)),
            start_in_edit_mode: false,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Portal document location, honouring `PORTAL_SETTINGS_PATH`.
    pub fn portal_settings_path(&self) -> PathBuf {
        match std::env::var(PORTAL_SETTINGS_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => PathBuf::from(&self.portal_settings_path),
        }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}
