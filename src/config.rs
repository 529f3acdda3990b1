use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::priority::DEFAULT_URGENT_WINDOW_DAYS;

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tests due within this many days pull their topics to the top.
    pub urgent_window_days: i64,
    /// Default tracing directive; `RUST_LOG` overrides it.
    pub log_level: String,
    pub group_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urgent_window_days: DEFAULT_URGENT_WINDOW_DAYS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            group_file: None,
        }
    }
}

impl Config {
    /// Loads the config at `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&raw).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("STUDYSYNC_CONFIG") {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studysync")
        .join(CONFIG_FILE_NAME)
}

/// Picks the group snapshot: explicit flag, then `STUDYSYNC_GROUP`, then config, then `./group.json`.
pub fn resolve_group_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    let path = flag
        .or_else(|| std::env::var("STUDYSYNC_GROUP").ok().map(PathBuf::from))
        .or_else(|| config.group_file.clone())
        .unwrap_or_else(|| PathBuf::from("group.json"));
    debug!(path = %path.display(), "using group snapshot");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    mod load_tests {
        use super::*;

        #[test]
        fn missing_file_uses_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let config = Config::load(dir.path().join("nope.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.urgent_window_days, 7);
            assert_eq!(config.log_level, "warn");
        }

        #[test]
        fn partial_file_keeps_other_defaults() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "urgent_window_days = 3").unwrap();

            let config = Config::load(file.path()).unwrap();
            assert_eq!(config.urgent_window_days, 3);
            assert_eq!(config.log_level, "warn");
            assert!(config.group_file.is_none());
        }

        #[test]
        fn full_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(
                file,
                "urgent_window_days = 10\nlog_level = \"debug\"\ngroup_file = \"/tmp/g.json\""
            )
            .unwrap();

            let config = Config::load(file.path()).unwrap();
            assert_eq!(config.urgent_window_days, 10);
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.group_file, Some(PathBuf::from("/tmp/g.json")));
        }

        #[test]
        fn invalid_file_is_an_error() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "urgent_window_days = \"soon\"").unwrap();

            let result = Config::load(file.path());
            assert!(matches!(result, Err(Error::Toml { .. })));
        }
    }

    mod path_tests {
        use super::*;
        use std::env;

        #[test]
        fn config_path_uses_env_var() {
            let test_path = "/tmp/test_studysync.toml";
            env::set_var("STUDYSYNC_CONFIG", test_path);

            let path = get_config_path();
            assert_eq!(path.to_str().unwrap(), test_path);

            env::remove_var("STUDYSYNC_CONFIG");
        }

        #[test]
        fn group_flag_wins() {
            let config = Config {
                group_file: Some(PathBuf::from("/from/config.json")),
                ..Config::default()
            };
            let path = resolve_group_path(Some(PathBuf::from("/from/flag.json")), &config);
            assert_eq!(path, PathBuf::from("/from/flag.json"));
        }
    }
}
