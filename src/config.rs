use crate::error::{Error, Result};
use crate::models::Config;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names looked up in the current and home directories, in order
pub const CONFIG_FILE_NAMES: [&str; 3] = [
    ".workaround-tracker.yaml",
    ".workaround-tracker.yml",
    ".workaround-tracker.toml",
];

/// Load configuration from file or use defaults
///
/// Search order:
/// 1. Custom path if provided via --config-file
/// 2. .workaround-tracker.{yaml,yml,toml} in current directory
/// 3. The same names in the home directory
/// 4. Built-in defaults
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config_from_file(path);
    }

    let home = dirs::home_dir();
    let search_dirs = [Some(PathBuf::from(".")), home];
    for dir in search_dirs.iter().flatten() {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using config file");
                return load_config_from_file(&candidate);
            }
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(Config::default())
}

/// Load config from a specific file
pub fn load_config_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let config = parse_config(&contents, path)?;
    config.validate()?;
    Ok(config)
}

/// Parse TOML when `origin` ends in `.toml`, YAML otherwise
fn parse_config(contents: &str, origin: &Path) -> Result<Config> {
    let is_toml = origin.extension().is_some_and(|ext| ext == "toml");
    let parsed = if is_toml {
        toml::from_str(contents).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| Error::ConfigParse {
        path: origin.to_path_buf(),
        message,
    })
}
