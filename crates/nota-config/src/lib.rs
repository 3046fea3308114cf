use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not expand notes path {path} from {origin}: {message}")]
    ExpandError {
        path: String,
        origin: Source,
        message: String,
    },
}

/// Environment variable naming the notes directory when the config file
/// doesn't set one.
pub const NOTES_HOME_VAR: &str = "NOTA_HOME";

const DEFAULT_NOTES_DIR: &str = "~/.nota";

/// Where the notes directory setting was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Env,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Env => write!(f, "${NOTES_HOME_VAR}"),
            Source::Default => f.write_str("built-in default"),
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    notes_path: Option<String>,
}

/// Resolved settings: an absolute-or-relative notes directory with `~` and
/// `$VAR` already expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub notes_path: PathBuf,
    pub source: Source,
}

impl Config {
    /// Resolves against the user's config file and environment.
    pub fn resolve() -> Result<Self, ConfigError> {
        let notes_home = std::env::var(NOTES_HOME_VAR).ok();
        Self::resolve_from(&Self::config_path(), notes_home.as_deref())
    }

    /// `notes_path` from the config file at `config_path` if it sets one,
    /// else `notes_home` when non-blank, else `~/.nota`.
    pub fn resolve_from(config_path: &Path, notes_home: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = read_config_file(config_path)?.notes_path {
            return Self::expanded(&raw, Source::File(config_path.to_path_buf()));
        }
        match notes_home.filter(|v| !v.trim().is_empty()) {
            Some(raw) => Self::expanded(raw, Source::Env),
            None => Self::expanded(DEFAULT_NOTES_DIR, Source::Default),
        }
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/nota");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expanded(raw: &str, source: Source) -> Result<Self, ConfigError> {
        let expanded = shellexpand::full(raw).map_err(|e| ConfigError::ExpandError {
            path: raw.to_string(),
            origin: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            notes_path: PathBuf::from(expanded.as_ref()),
            source,
        })
    }
}

/// A missing file reads as empty.
fn read_config_file(config_path: &Path) -> Result<ConfigFile, ConfigError> {
    if !config_path.exists() {
        return Ok(ConfigFile::default());
    }
    let content =
        std::fs::read_to_string(config_path).map_err(|source| ConfigError::ConfigReadError {
            config_path: config_path.to_path_buf(),
            source,
        })?;
    toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
        config_path: config_path.to_path_buf(),
        source,
    })
}
