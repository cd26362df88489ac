/// Application settings, loaded from `settings.toml`
///
/// Resolution order for the settings directory:
/// 1. `GALLERY_GRAB_CONFIG_DIR` environment variable
/// 2. Platform config directory via `dirs` (e.g. `~/.config/gallery-grab`)
///
/// Command line flags (`--server`, `--download-dir`, `--limit`) are applied
/// on top of whatever the file contains and are never written back.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const APP_DIR: &str = "gallery-grab";
pub const CONFIG_FILE: &str = "settings.toml";
pub const ENV_CONFIG_DIR: &str = "GALLERY_GRAB_CONFIG_DIR";

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
/// Searches can take minutes for large limits
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the gallery server
    pub server_url: String,
    /// Where downloaded archives go; platform downloads folder when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    /// Per-request timeout in seconds, 0 to wait forever
    pub request_timeout_secs: u64,
    /// Pre-filled value of the "number of images" field
    pub default_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            download_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl Config {
    /// Directory archives are written to
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Apply command line overrides
    pub fn apply(&mut self, args: CliArgs) {
        if let Some(server) = args.server {
            self.server_url = server;
        }
        if let Some(dir) = args.download_dir {
            self.download_dir = Some(dir);
        }
        if let Some(limit) = args.limit {
            self.default_limit = limit;
        }
    }
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub server: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub limit: Option<u32>,
}

impl CliArgs {
    pub fn parse(mut args: pico_args::Arguments) -> Result<Self> {
        let parsed = Self {
            server: args.opt_value_from_str("--server").map_err(cli_error)?,
            download_dir: args.opt_value_from_str("--download-dir").map_err(cli_error)?,
            limit: args.opt_value_from_str("--limit").map_err(cli_error)?,
        };

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(Error::Config(format!("unexpected arguments: {:?}", rest)));
        }
        if parsed.limit == Some(0) {
            return Err(Error::Config("--limit must be a positive number".to_string()));
        }
        Ok(parsed)
    }
}

fn cli_error(err: pico_args::Error) -> Error {
    Error::Config(err.to_string())
}

/// Path of `settings.toml`, or `None` when no config directory is known
pub fn config_path() -> Option<PathBuf> {
    let dir = std::env::var_os(ENV_CONFIG_DIR)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR)))?;
    Some(dir.join(CONFIG_FILE))
}

/// Load settings, falling back to defaults
///
/// The second value is a warning for the user when the file exists but
/// could not be read.
pub fn load() -> (Config, Option<String>) {
    let Some(path) = config_path() else {
        return (Config::default(), None);
    };

    match load_from_path(&path) {
        Ok(config) => (config, None),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring settings file");
            (
                Config::default(),
                Some(format!("Settings in {} were ignored: {}", path.display(), err)),
            )
        }
    }
}

/// Load settings from `path`; a missing file yields the defaults
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

pub fn save(config: &Config) -> Result<()> {
    match config_path() {
        Some(path) => save_to_path(config, &path),
        None => Ok(()),
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> pico_args::Arguments {
        pico_args::Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_from_path(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "server_url = \"http://gallery.lan:8080\"\nrequest_timeout_secs = 0\n").unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.server_url, "http://gallery.lan:8080");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "not = valid = toml").unwrap();

        assert!(matches!(load_from_path(&path), Err(Error::Config(_))));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            server_url: "http://10.0.0.2:5000".into(),
            download_dir: Some(PathBuf::from("/srv/zips")),
            request_timeout_secs: 60,
            default_limit: 25,
        };

        save_to_path(&config, &path).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn explicit_download_dir_wins() {
        let config = Config {
            download_dir: Some(PathBuf::from("/tmp/out")),
            ..Config::default()
        };
        assert_eq!(config.download_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let cli = CliArgs::parse(args(&["--server", "http://other:9000", "--limit", "5"])).unwrap();
        let mut config = Config::default();
        config.apply(cli);

        assert_eq!(config.server_url, "http://other:9000");
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.download_dir, None);
    }

    #[test]
    fn cli_rejects_bad_values() {
        assert!(CliArgs::parse(args(&["--limit", "many"])).is_err());
        assert!(CliArgs::parse(args(&["--limit", "0"])).is_err());
        assert!(CliArgs::parse(args(&["stray"])).is_err());
        assert_eq!(CliArgs::parse(args(&[])).unwrap(), CliArgs::default());
    }
}
