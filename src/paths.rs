//! Default on-disk locations
//!
//! Follows the XDG layout on Linux (`~/.cache/shelf/`, `~/.config/shelf/`)
//! and the platform equivalents elsewhere.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the providers directory inside the config directory
pub const PROVIDERS_DIR: &str = "providers";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "shelf")
}

/// Directory holding cache files
///
/// Returns `None` if no home directory can be determined.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding the configuration file and installed providers
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default configuration file path
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Default directory scanned for providers
pub fn providers_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(PROVIDERS_DIR))
}
