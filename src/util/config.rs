use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Error as SerdeError;

use crate::domain::EngineDefaults;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "Cleanuva";
const APP_NAME: &str = "SalesHub";

pub const CATALOG_DIR_ENV: &str = "CLEANUVA_CATALOG_DIR";
pub const DEFAULTS_FILE_ENV: &str = "CLEANUVA_DEFAULTS";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
}

fn defaults_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(DEFAULTS_FILE_ENV) {
        return Some(PathBuf::from(path));
    }
    project_dirs().map(|dirs| dirs.config_dir().join("defaults.json"))
}

/// Catalog directory forced through the environment.
pub fn catalog_dir_override() -> Option<PathBuf> {
    std::env::var_os(CATALOG_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Where exported sheets live for this user, whether or not it exists yet.
pub fn user_catalog_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("catalog"))
}

pub fn read_engine_defaults(path: &Path) -> Result<EngineDefaults, ConfigError> {
    let data = fs::read_to_string(path)?;
    let defaults: EngineDefaults = serde_json::from_str(&data)?;
    defaults.validate().map_err(ConfigError::Invalid)?;
    Ok(defaults)
}

/// Engine defaults from the user's config file, or the built-in values when
/// the file is absent or unreadable.
pub fn load_engine_defaults() -> EngineDefaults {
    let Some(path) = defaults_file() else {
        return EngineDefaults::default();
    };
    if !path.exists() {
        log::debug!("[config] No defaults file at {}", path.display());
        return EngineDefaults::default();
    }

    match read_engine_defaults(&path) {
        Ok(defaults) => {
            log::info!("[config] Loaded engine defaults from {}", path.display());
            defaults
        }
        Err(err) => {
            log::warn!(
                "[config] Ignoring {}: {err}; using built-in defaults",
                path.display()
            );
            EngineDefaults::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
    #[error("invalid engine defaults: {0}")]
    Invalid(String),
}
