use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the hook configuration.
pub const DEFAULT_CONFIG_PATH: &str = "/tmp/lease_routes_config.json";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "LEASE_ROUTES_CONFIG_PATH";

/// Hook configuration, read once per invocation.
///
/// Keys keep the upper-case names operators already have in their
/// `lease_routes_config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON route cache.
    #[serde(rename = "ROUTES_FILE")]
    pub routes_file: PathBuf,
    #[serde(rename = "LOG_FILE")]
    pub log_file: PathBuf,
    /// Private key passed to `ssh -i`.
    #[serde(rename = "SSH_IDENTITY_FILE")]
    pub ssh_identity_file: PathBuf,
    #[serde(rename = "SSH_USERNAME")]
    pub ssh_username: String,
    /// Relay addresses allowed to trigger route changes.
    #[serde(rename = "MANAGED_SWITCHES")]
    pub managed_switches: Vec<String>,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Configuration file {} not found", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Error decoding JSON from {}", path.display()))?;
        Ok(config)
    }

    pub fn is_managed_switch(&self, addr: &str) -> bool {
        self.managed_switches.iter().any(|s| s == addr)
    }
}

/// Config path, honouring the `LEASE_ROUTES_CONFIG_PATH` override.
pub fn config_path() -> PathBuf {
    PathBuf::from(
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "ROUTES_FILE": "/var/lib/kea/routes.json",
        "LOG_FILE": "/var/log/kea/lease-routes.log",
        "SSH_IDENTITY_FILE": "/etc/kea/id_ed25519",
        "SSH_USERNAME": "kea",
        "MANAGED_SWITCHES": ["2001:db8:ffff::1", "2001:db8:ffff::2"]
    }"#;

    #[test]
    fn test_parse_config() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.routes_file, PathBuf::from("/var/lib/kea/routes.json"));
        assert_eq!(config.ssh_username, "kea");
        assert_eq!(config.managed_switches.len(), 2);
        assert!(config.is_managed_switch("2001:db8:ffff::2"));
        assert!(!config.is_managed_switch("2001:db8:ffff::3"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let json = r#"{ "ROUTES_FILE": "/tmp/r.json", "LOG_FILE": "/tmp/l.log" }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.ssh_identity_file, PathBuf::from("/etc/kea/id_ed25519"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = Config::load_from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("not found"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let err = Config::load_from_file(&broken).unwrap_err();
        assert!(err.to_string().contains("Error decoding JSON"));
    }
}
