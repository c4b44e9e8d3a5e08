//! Configuration loading: defaults, optional TOML file, environment overrides

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";
const DEFAULT_API_BASE_URL: &str = "https://api.toodledo.com/3";
/// Write scope is required for task creation.
const DEFAULT_SCOPES: &str = "basic tasks write folders";

/// Application settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub token_storage_path: PathBuf,
    /// Space separated OAuth scopes, only sent in the authorization URL
    pub scopes: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_storage_path: Self::config_dir()
                .map(|dir| dir.join("tokens.json"))
                .unwrap_or_default(),
            scopes: DEFAULT_SCOPES.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .field("token_storage_path", &self.token_storage_path)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Settings {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "toodledo", "toodledo")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get default config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load settings from an explicit file, or the default config file if it
    /// exists, then apply environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        settings.apply_env(|key| std::env::var(key).ok());
        settings.token_storage_path = expand_home(&settings.token_storage_path);
        settings.validate()?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Overlay values from environment variables (empty values are ignored).
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("TOODLEDO_CLIENT_ID") {
            self.client_id = v;
        }
        if let Some(v) = var("TOODLEDO_CLIENT_SECRET") {
            self.client_secret = v;
        }
        if let Some(v) = var("TOODLEDO_REDIRECT_URI") {
            self.redirect_uri = v;
        }
        if let Some(v) = var("TOODLEDO_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = var("TOKEN_STORAGE_PATH") {
            self.token_storage_path = PathBuf::from(v);
        }
        if let Some(v) = var("TOODLEDO_SCOPES") {
            self.scopes = v;
        }
    }

    /// Reject settings the OAuth flow cannot work without.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("TOODLEDO_CLIENT_ID", self.client_id.as_str()),
            ("TOODLEDO_CLIENT_SECRET", self.client_secret.as_str()),
            ("TOODLEDO_REDIRECT_URI", self.redirect_uri.as_str()),
            ("TOODLEDO_API_BASE_URL", self.api_base_url.as_str()),
            ("TOODLEDO_SCOPES", self.scopes.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("{} is required", name);
            }
        }
        if self.token_storage_path.as_os_str().is_empty() {
            bail!("TOKEN_STORAGE_PATH is required");
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match home::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
