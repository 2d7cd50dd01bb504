//! watchsync configuration.
//!
//! Loaded once at startup from `~/.config/watchsync/config.toml` (or the
//! path given with `--config`) and passed explicitly to each run.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{SyncError, SyncResult};
use crate::filter::DEFAULT_MIN_DURATION_MINUTES;
use crate::publish::PublishPolicy;

/// Environment variable that overrides `graph.client_secret`.
pub const CLIENT_SECRET_ENV: &str = "WATCHSYNC_CLIENT_SECRET";

const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,

    pub graph: Option<GraphSettings>,

    #[serde(default)]
    pub sync: SyncSettings,
}

/// File locations. Relative paths are resolved against the directory that
/// holds the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub raw_export: PathBuf,
    pub canonical_dataset: PathBuf,
    pub watermark: PathBuf,
    pub log_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            raw_export: PathBuf::from("PrimeVideo.ViewingHistory.csv"),
            canonical_dataset: PathBuf::from("PrimeVideo.ViewingHistory_clean.csv"),
            watermark: PathBuf::from("last_event_log.csv"),
            log_file: PathBuf::from("create_events_log.txt"),
        }
    }
}

/// Client-credentials app registration and the mailbox to write to.
#[derive(Clone, Deserialize)]
pub struct GraphSettings {
    pub client_id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub client_secret: String,
    pub user_id: String,

    #[serde(default = "default_authority_url")]
    pub authority_url: String,

    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

impl fmt::Debug for GraphSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSettings")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_secret", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("authority_url", &self.authority_url)
            .field("graph_url", &self.graph_url)
            .finish()
    }
}

impl GraphSettings {
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn events_url(&self) -> String {
        format!(
            "{}/users/{}/events",
            self.graph_url.trim_end_matches('/'),
            self.user_id
        )
    }

    fn validate(&self) -> SyncResult<()> {
        let required = [
            ("client_id", &self.client_id),
            ("tenant_id", &self.tenant_id),
            ("client_secret", &self.client_secret),
            ("user_id", &self.user_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "graph.{} is empty (the secret can also come from {})",
                    name, CLIENT_SECRET_ENV
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// IANA zone used both to render local times and to label events.
    pub timezone: String,
    pub min_duration_minutes: u32,
    pub subject_prefix: String,
    pub category: String,
    pub publish_policy: PublishPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            timezone: "America/New_York".to_string(),
            min_duration_minutes: DEFAULT_MIN_DURATION_MINUTES,
            subject_prefix: "Prime TV: ".to_string(),
            category: "Prime TV".to_string(),
            publish_policy: PublishPolicy::default(),
        }
    }
}

impl SyncSettings {
    pub fn display_zone(&self) -> SyncResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| SyncError::Config(format!("Unknown timezone '{}': {}", self.timezone, e)))
    }
}

impl Config {
    /// Default config file location (~/.config/watchsync/config.toml).
    pub fn default_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("watchsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load and validate the config file, applying environment overrides.
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            return Err(SyncError::Config(format!(
                "Config file not found at {}\n\
                Create one with `watchsync config init`.",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read config file at {}: {}", path.display(), e))
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut config = Self::from_toml_str(&contents, base_dir)?;

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV)
            && !secret.is_empty()
            && let Some(graph) = config.graph.as_mut()
        {
            graph.client_secret = secret;
        }

        Ok(config)
    }

    /// Parse config text, resolving relative paths against `base_dir`.
    pub fn from_toml_str(contents: &str, base_dir: &Path) -> SyncResult<Self> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;

        config.paths.raw_export = resolve_path(&config.paths.raw_export, base_dir);
        config.paths.canonical_dataset = resolve_path(&config.paths.canonical_dataset, base_dir);
        config.paths.watermark = resolve_path(&config.paths.watermark, base_dir);
        config.paths.log_file = resolve_path(&config.paths.log_file, base_dir);

        config.sync.display_zone()?;

        Ok(config)
    }

    /// Graph settings, required for publishing but not for ingesting.
    pub fn graph(&self) -> SyncResult<&GraphSettings> {
        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| SyncError::Config("Missing [graph] section".into()))?;
        graph.validate()?;
        Ok(graph)
    }

    /// Write a starter config file with every option documented.
    pub fn create_default(path: &Path) -> SyncResult<()> {
        if path.exists() {
            return Err(SyncError::Config(format!(
                "Config file already exists at {}",
                path.display()
            )));
        }

        let defaults = Paths::default();
        let sync = SyncSettings::default();
        let contents = format!(
            "\
# watchsync configuration
# Relative paths are resolved against this file's directory.

[paths]
raw_export = \"{}\"
canonical_dataset = \"{}\"
watermark = \"{}\"
log_file = \"{}\"

[graph]
client_id = \"\"
tenant_id = \"\"
# Or set {}:
client_secret = \"\"
# Mailbox that receives the events:
user_id = \"\"

[sync]
timezone = \"{}\"
min_duration_minutes = {}
subject_prefix = \"{}\"
category = \"{}\"
# \"all\" publishes the whole batch, \"first\" only its first record:
publish_policy = \"all\"
",
            defaults.raw_export.display(),
            defaults.canonical_dataset.display(),
            defaults.watermark.display(),
            defaults.log_file.display(),
            CLIENT_SECRET_ENV,
            sync.timezone,
            sync.min_duration_minutes,
            sync.subject_prefix,
            sync.category,
        );

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

/// Expand `~` and anchor relative paths at `base_dir`.
fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}
