use crate::error::Result;
use crate::io;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "shipnote.yaml";

// ---------------------------------------------------------------------------
// Branding
// ---------------------------------------------------------------------------

/// Project identity used to build absolute links and style outgoing email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// Public base URL of the board, without a trailing slash. Empty when
    /// the instance has not been configured yet; links degrade to relative
    /// paths in that case.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
}

fn default_project_name() -> String {
    "Shipnote".to_string()
}

fn default_primary_color() -> String {
    "#7c3aed".to_string()
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            base_url: String::new(),
            primary_color: default_primary_color(),
        }
    }
}

// ---------------------------------------------------------------------------
// SmtpConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpEncryption {
    None,
    StartTls,
    Tls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from_address: String,
    #[serde(default = "default_encryption")]
    pub encryption: SmtpEncryption,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_encryption() -> SmtpEncryption {
    SmtpEncryption::StartTls
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            encryption: default_encryption(),
        }
    }
}

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl BoardConfig {
    /// Load from `<root>/shipnote.yaml`, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let mut config: BoardConfig = serde_yaml::from_str(&data)?;
        config.branding.base_url = normalize_base_url(&config.branding.base_url);
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let mut clone = self.clone();
        clone.branding.base_url = normalize_base_url(&clone.branding.base_url);
        let data = serde_yaml::to_string(&clone)?;
        io::atomic_write(&root.join(CONFIG_FILE), data.as_bytes())
    }
}

/// Strip trailing slashes so `{base}/{slug}` concatenation never doubles up.
fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BoardConfig::load(dir.path()).unwrap();
        assert_eq!(config.branding.project_name, "Shipnote");
        assert!(config.branding.base_url.is_empty());
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut config = BoardConfig::default();
        config.branding.project_name = "Acme Changelog".into();
        config.branding.base_url = "https://news.acme.dev/".into();
        config.save(dir.path()).unwrap();

        let loaded = BoardConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.branding.project_name, "Acme Changelog");
        // trailing slash stripped on the way through
        assert_eq!(loaded.branding.base_url, "https://news.acme.dev");
    }

    #[test]
    fn normalize_strips_trailing_slashes_and_whitespace() {
        assert_eq!(normalize_base_url(" https://a.dev// "), "https://a.dev");
        assert_eq!(normalize_base_url(""), "");
    }
}
