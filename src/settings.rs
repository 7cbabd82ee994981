//! Persistent settings for the bug tracker app.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the configured database URL.
pub const DATABASE_URL_ENV: &str = "BUGTRACKER_DATABASE_URL";

/// Banner durations the settings panel offers, in seconds.
pub const BANNER_SECS_MIN: f32 = 1.0;
pub const BANNER_SECS_MAX: f32 = 15.0;

/// Which backing store to open at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

impl StoreKind {
    pub fn label(&self) -> &'static str {
        match self {
            StoreKind::Postgres => "PostgreSQL",
            StoreKind::Memory => "In-memory",
        }
    }
}

/// The signed-in user as far as this app is concerned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Stable id stamped as `create_by_id`
    #[serde(default)]
    pub uid: Option<String>,
    /// Display name stamped as `create_by`
    #[serde(default)]
    pub display_name: Option<String>,
}

/// All persistable settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Store
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    #[serde(default = "default_db_user")]
    pub db_user: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Users created in the in-memory store at startup
    #[serde(default = "default_seed_users")]
    pub seed_users: Vec<String>,

    // Identity
    #[serde(default)]
    pub identity: IdentitySettings,

    // Display
    /// How long success/error banners stay up
    #[serde(default = "default_banner_secs")]
    pub banner_secs: f32,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "bugtracker".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_seed_users() -> Vec<String> {
    vec!["Alice".to_string(), "Bob".to_string()]
}

fn default_banner_secs() -> f32 {
    4.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreKind::Postgres,
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_user: default_db_user(),
            db_name: default_db_name(),
            max_connections: default_max_connections(),
            seed_users: default_seed_users(),
            identity: IdentitySettings::default(),
            banner_secs: default_banner_secs(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("bugtracker-native");
            p.push("settings.json");
            p
        })
    }

    /// Connection URL, from the environment if set.
    pub fn database_url(&self) -> String {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => format!(
                "postgres://{}@{}:{}/{}",
                self.db_user, self.db_host, self.db_port, self.db_name
            ),
        }
    }

    /// Banner lifetime. Out-of-range values from the file are clamped;
    /// NaN or infinite ones fall back to the default.
    pub fn banner_ttl(&self) -> Duration {
        let secs = if self.banner_secs.is_finite() {
            self.banner_secs.clamp(BANNER_SECS_MIN, BANNER_SECS_MAX)
        } else {
            default_banner_secs()
        };
        Duration::from_secs_f32(secs)
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!(path = %path.display(), "Loaded settings");
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Saved settings");
        Ok(())
    }
}
