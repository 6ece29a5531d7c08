//! Settings file (`gantry.toml`)
//!
//! Every key is optional. A missing file means all defaults; a file that
//! does not parse is an error rather than being silently ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Packages installed by the apt stage
    pub apt_packages: Vec<String>,
    /// Group the gunicorn service runs as
    pub service_group: String,
    /// User the gunicorn service runs as (defaults to the invoking user)
    pub service_user: Option<String>,
    /// Elevation wrapper for privileged commands
    pub elevation_program: String,
    pub systemd_dir: PathBuf,
    pub nginx_sites_available: PathBuf,
    pub nginx_sites_enabled: PathBuf,
    /// Directory holding `gunicorn.socket`, `gunicorn.service` and `nginx.conf`
    /// overrides; the bundled templates are used when unset
    pub templates_dir: Option<PathBuf>,
    /// Endpoint answering with this host's public IPv4
    pub public_ip_url: String,
    /// Requirements files to try, first match wins
    pub requirements_files: Vec<String>,
    /// Branch cloned when `--branch` is not given
    pub branch: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            apt_packages: [
                "python3-pip",
                "python3-dev",
                "libpq-dev",
                "nginx",
                "curl",
                "postgresql",
                "postgresql-contrib",
                "zsh",
                "git",
                "systemd",
                "python3-venv",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            service_group: "www-data".to_string(),
            service_user: None,
            elevation_program: "sudo".to_string(),
            systemd_dir: PathBuf::from("/etc/systemd/system"),
            nginx_sites_available: PathBuf::from("/etc/nginx/sites-available"),
            nginx_sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            templates_dir: None,
            public_ip_url: "https://ipv4.icanhazip.com/".to_string(),
            requirements_files: vec![
                "requirements.txt".to_string(),
                "chill.requirements.txt".to_string(),
            ],
            branch: "master".to_string(),
        }
    }
}

impl Settings {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load from an explicit file, defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let mut settings: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        if let Some(dir) = &settings.templates_dir {
            settings.templates_dir = Some(paths::expand(&dir.to_string_lossy()));
        }

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("gantry.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.apt_packages.len(), 11);
        assert_eq!(settings.branch, "master");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gantry.toml");
        fs::write(
            &path,
            r#"
service_group = "nginx"
apt_packages = ["git", "nginx"]
elevation_program = "doas"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.service_group, "nginx");
        assert_eq!(settings.apt_packages, vec!["git", "nginx"]);
        assert_eq!(settings.elevation_program, "doas");
        assert_eq!(settings.systemd_dir, PathBuf::from("/etc/systemd/system"));
        assert_eq!(settings.requirements_files[0], "requirements.txt");
    }

    #[test]
    fn test_templates_dir_is_expanded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gantry.toml");
        fs::write(&path, "templates_dir = \"~/gantry-templates\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(settings.templates_dir, Some(home.join("gantry-templates")));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gantry.toml");
        fs::write(&path, "service_group = [").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid settings"));
    }

    #[test]
    fn test_unknown_key_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gantry.toml");
        fs::write(&path, "servce_group = \"www-data\"\n").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }
}
