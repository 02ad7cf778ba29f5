//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use wallpaper_http::ClientConfig;

/// Default location of the client configuration file
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

/// Load the client configuration
///
/// An explicit path must exist; otherwise `<data dir>/config.json` is used
/// when present. `WALLPAPER_*` environment variables override both.
pub fn load_client_config(explicit: Option<&Path>, data_dir: &Path) -> Result<ClientConfig> {
    let path = match explicit {
        Some(path) => {
            anyhow::ensure!(path.exists(), "config file {} not found", path.display());
            Some(path.to_path_buf())
        }
        None => Some(default_config_path(data_dir)).filter(|path| path.exists()),
    };

    ClientConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "failed to load configuration from the environment".to_string(),
    })
}

/// Save client configuration to JSON file
pub fn save_client_config<P: AsRef<Path>>(config: &ClientConfig, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Generate a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    save_client_config(&ClientConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        generate_default_config(default_config_path(dir.path())).unwrap();

        let loaded = load_client_config(None, dir.path()).unwrap();
        assert_eq!(loaded.login_path, ClientConfig::default().login_path);
        assert_eq!(loaded.timeout_secs, ClientConfig::default().timeout_secs);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(load_client_config(Some(&missing), dir.path()).is_err());
    }
}
