use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use directories::BaseDirs;

use crate::api::models::Contact;
use crate::error::ConfigError;

// one day; keeps timer deadlines and chrono durations far from overflow
const MAX_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Seconds between re-fetches of the active conversation.
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// How far a server echo of a sent message may drift from the local
    /// timestamp and still count as the same message.
    pub echo_skew_secs: u64,
    pub contacts: Vec<Contact>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            poll_interval_secs: 90,
            request_timeout_secs: 10,
            echo_skew_secs: 120,
            contacts: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("centauri-chat.toml"))
    }

    /// Loads the user config, falling back to defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::new();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::new(),
            Err(e) => {
                log::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.username.trim().is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.clamp(1, MAX_INTERVAL_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, MAX_INTERVAL_SECS))
    }

    pub fn echo_skew(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.echo_skew_secs.min(MAX_INTERVAL_SECS) as i64)
    }

    /// Adds a contact unless one with the same address is already listed.
    pub fn remember_contact(&mut self, contact: Contact) -> bool {
        if self.contacts.iter().any(|c| c.address == contact.address) {
            return false;
        }
        self.contacts.push(contact);
        true
    }
}
