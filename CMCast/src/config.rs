//! Server configuration, loaded from a YAML file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default port for both the RPC facade and the discovery responder.
const DEFAULT_PORT: u16 = 4004;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub http_port: u16,
    #[serde(default = "default_port")]
    pub discovery_port: u16,
    /// Base URL receivers use to fetch media; derived from the local IP and
    /// the http port when unset.
    #[serde(default)]
    pub media_base_url: Option<String>,
    /// Section name to directory path; scanned recursively into the catalog.
    /// Sections are visited in name order.
    pub folders: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub games_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("unable to load configuration file: {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid configuration file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmcast.yaml");
        fs::write(&path, "folders:\n  music: /srv/music\n  videos: /srv/videos\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.http_port, 4004);
        assert_eq!(config.discovery_port, 4004);
        assert!(config.media_base_url.is_none());
        assert!(config.games_dir.is_none());

        let sections: Vec<&str> = config.folders.keys().map(String::as_str).collect();
        assert_eq!(sections, vec!["music", "videos"]);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmcast.yaml");
        fs::write(
            &path,
            "http_port: 8080\ndiscovery_port: 4010\nmedia_base_url: http://10.0.0.5:8080\nfolders:\n  music: /srv/music\ngames_dir: /srv/games\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.discovery_port, 4010);
        assert_eq!(config.media_base_url.as_deref(), Some("http://10.0.0.5:8080"));
        assert_eq!(config.games_dir.as_deref(), Some(Path::new("/srv/games")));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/cmcast.yaml")).is_err());
    }
}
