//! Path resolution for gantry
//!
//! # Environment Variables
//!
//! - `GANTRY_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/gantry`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `GANTRY_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/gantry` (if set)
//! 3. `~/.config/gantry`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "GANTRY_CONFIG_DIR";

/// Settings file name inside the config directory
pub const CONFIG_FILE: &str = "gantry.toml";

/// Get the gantry config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("gantry");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("gantry");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Path of the settings file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}


#[cfg(test)]
mod tests {
    use super::test_env::{lock, with_env_var, without_env_var};
    use super::*;

    #[test]
    fn test_config_dir_env_override() {
        let _guard = lock();
        with_env_var(ENV_CONFIG_DIR, "/custom/config/path", || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let _guard = lock();
        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_CONFIG_DIR, "~/dotfiles/gantry-tilde-test", || {
            assert_eq!(
                config_dir().unwrap(),
                home.join("dotfiles").join("gantry-tilde-test")
            );
        });
    }

    #[test]
    fn test_xdg_config_home() {
        let _guard = lock();
        without_env_var(ENV_CONFIG_DIR, || {
            with_env_var("XDG_CONFIG_HOME", "/tmp/xdg-config-test", || {
                assert_eq!(
                    config_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-config-test/gantry")
                );
            });
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_default_config_dir_unix() {
        let _guard = lock();
        without_env_var(ENV_CONFIG_DIR, || {
            without_env_var("XDG_CONFIG_HOME", || {
                let home = dirs::home_dir().unwrap();
                assert_eq!(config_dir().unwrap(), home.join(".config").join("gantry"));
            });
        });
    }

    #[test]
    fn test_config_file_name() {
        let _guard = lock();
        with_env_var(ENV_CONFIG_DIR, "/etc/gantry", || {
            assert_eq!(config_file().unwrap(), PathBuf::from("/etc/gantry/gantry.toml"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/test/path"), home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_with_env_var() {
        let _guard = lock();
        with_env_var("GANTRY_TEST_VAR", "test_value", || {
            assert_eq!(
                expand("/path/$GANTRY_TEST_VAR/file"),
                PathBuf::from("/path/test_value/file")
            );
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
