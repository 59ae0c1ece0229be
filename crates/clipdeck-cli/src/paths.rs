// crates/clipdeck-cli/src/paths.rs
// Single source of truth for where clipdeck reads config and writes logs.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "clipdeck";

/// `$XDG_CONFIG_HOME/clipdeck/config.json`, falling back to
/// `~/.config/clipdeck/config.json`. `%APPDATA%\clipdeck\config.json` on Windows.
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    let path = std::env::var_os("APPDATA")
        .map(|p| PathBuf::from(p).join(APP_DIR).join("config.json"))
        .unwrap_or_else(|| config_path_from(None, None));
    #[cfg(not(target_os = "windows"))]
    let path = config_path_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from).as_deref(),
        std::env::var_os("HOME").map(PathBuf::from).as_deref(),
    );
    path
}

fn config_path_from(xdg: Option<&Path>, home: Option<&Path>) -> PathBuf {
    let base = match (xdg, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg.to_path_buf(),
        (_, Some(home)) => home.join(".config"),
        _ => std::env::temp_dir(),
    };
    base.join(APP_DIR).join("config.json")
}

/// `clipdeck.log` in the OS temp directory.
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join("clipdeck.log")
}
