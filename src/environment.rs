//! Environment overlay for child processes
//!
//! Variables imported from an activation script or a `.env` file are kept
//! in an [`Environment`] owned by the deploy context, not written into this
//! process's own environment. The executor applies the overlay to every
//! child it spawns, so children see the inherited environment with the
//! imported keys added or overwritten. Nothing is ever removed.

use crate::error::{DeploymentError, Result};
use crate::runner::{ExecOptions, Executor};
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker a Python virtualenv activation script exports
pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";

/// Overlay of variables applied to child processes, plus activation state
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    activated: Option<PathBuf>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Add or overwrite variables
    pub fn merge<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.set(key, value);
        }
    }

    /// Value a child would see: the overlay first, then this process's environment
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    #[cfg(test)]
    pub fn is_activated(&self) -> bool {
        self.activated.is_some()
    }

    /// Script the overlay was activated from, if any
    pub fn activated_from(&self) -> Option<&Path> {
        self.activated.as_deref()
    }
}

/// Source `script` in a shell and merge the resulting environment
///
/// Only the first call per [`Environment`] does anything; later calls
/// return `Ok(false)` whatever the script path. After merging, `sentinel`
/// must be present or the activation is treated as failed.
pub fn import_from_script(
    env: &mut Environment,
    exec: &Executor,
    script: &Path,
    sentinel: &str,
) -> Result<bool> {
    if let Some(previous) = env.activated_from() {
        log::debug!(
            "Environment already activated from {}, not sourcing {}",
            previous.display(),
            script.display()
        );
        return Ok(false);
    }

    log::info!("Activating {}", script.display());
    let script_arg = script.to_string_lossy().into_owned();
    let output = exec.execute(
        &["sh", "-c", ". \"$1\" && env -0", "sh", script_arg.as_str()],
        &ExecOptions::default().capture(),
        env,
    )?;

    env.merge(parse_env_dump(&output.stdout));

    if !env.vars.contains_key(sentinel) {
        return Err(DeploymentError::EnvironmentActivation {
            script: script.to_path_buf(),
            sentinel: sentinel.to_string(),
        });
    }

    env.activated = Some(script.to_path_buf());
    log::info!("Environment activated");
    Ok(true)
}

/// Parse NUL-separated `KEY=VALUE` records as printed by `env -0`
pub fn parse_env_dump(dump: &str) -> Vec<(String, String)> {
    dump.split('\0')
        .filter_map(|record| record.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Parse a `.env` file: `KEY=VALUE` per line, blank lines and `#` comments skipped
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match line.split_once('=') {
            Some((key, value)) => Some((key.trim().to_string(), value.trim().to_string())),
            None => {
                log::warn!("Ignoring .env line without '=': {line}");
                None
            }
        })
        .collect()
}

/// Merge a `.env` file into the overlay; a missing file is not an error
pub fn load_dotenv(env: &mut Environment, path: &Path) -> anyhow::Result<usize> {
    if !path.exists() {
        log::info!("No .env file found at {}", path.display());
        return Ok(0);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let vars = parse_dotenv(&content);
    let count = vars.len();
    env.merge(vars);

    log::info!("Loaded {count} variable(s) from {}", path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeLauncher;
    use crate::sudo::Elevation;
    use tempfile::TempDir;

    const ACTIVATED: &str = "VIRTUAL_ENV=/srv/site/venv\0PATH=/srv/site/venv/bin:/usr/bin\0PS1=(venv) \0";

    #[test]
    fn test_import_merges_and_marks_activated() {
        let fake = FakeLauncher::new().respond("env -0", Some(0), ACTIVATED);
        let log = fake.log();
        let exec = Executor::new(Box::new(fake), Elevation::sudo());
        let mut env = Environment::new();
        env.set("DEBIAN_FRONTEND", "noninteractive");
        env.set("PATH", "/usr/bin");

        let script = Path::new("/srv/site/venv/bin/activate");
        assert!(import_from_script(&mut env, &exec, script, VIRTUAL_ENV).unwrap());

        assert_eq!(env.vars()["VIRTUAL_ENV"], "/srv/site/venv");
        assert_eq!(env.vars()["PATH"], "/srv/site/venv/bin:/usr/bin");
        assert_eq!(env.vars()["DEBIAN_FRONTEND"], "noninteractive");
        assert_eq!(env.activated_from(), Some(script));

        let call = &log.calls()[0];
        assert_eq!(call.argv[0], "sh");
        assert_eq!(call.argv.last().unwrap(), "/srv/site/venv/bin/activate");
    }

    #[test]
    fn test_second_import_is_a_no_op() {
        let fake = FakeLauncher::new().respond("env -0", Some(0), ACTIVATED);
        let log = fake.log();
        let exec = Executor::new(Box::new(fake), Elevation::sudo());
        let mut env = Environment::new();

        import_from_script(&mut env, &exec, Path::new("/a/bin/activate"), VIRTUAL_ENV).unwrap();
        let again =
            import_from_script(&mut env, &exec, Path::new("/b/bin/activate"), VIRTUAL_ENV).unwrap();

        assert!(!again);
        assert_eq!(log.len(), 1);
        assert_eq!(env.activated_from(), Some(Path::new("/a/bin/activate")));
    }

    #[test]
    fn test_missing_sentinel_fails_activation() {
        let fake = FakeLauncher::new().respond("env -0", Some(0), "PATH=/usr/bin\0");
        let exec = Executor::new(Box::new(fake), Elevation::sudo());
        let mut env = Environment::new();

        let err = import_from_script(&mut env, &exec, Path::new("/x/activate"), VIRTUAL_ENV)
            .unwrap_err();
        assert!(matches!(err, DeploymentError::EnvironmentActivation { .. }));
        assert!(!env.is_activated());
    }

    #[test]
    fn test_unreadable_script_is_command_failure() {
        let fake = FakeLauncher::new().fail("env -0", 2);
        let exec = Executor::new(Box::new(fake), Elevation::sudo());
        let mut env = Environment::new();

        let err = import_from_script(&mut env, &exec, Path::new("/nope"), VIRTUAL_ENV).unwrap_err();
        assert!(matches!(err, DeploymentError::CommandFailure { .. }));
    }

    #[test]
    fn test_real_shell_activation() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("activate");
        fs::write(&script, "export VIRTUAL_ENV=/opt/venv\nexport GANTRY_TEST_MULTI='a\nb'\n").unwrap();

        let exec = Executor::system(Elevation::disabled());
        let mut env = Environment::new();
        import_from_script(&mut env, &exec, &script, VIRTUAL_ENV).unwrap();

        assert_eq!(env.vars()["VIRTUAL_ENV"], "/opt/venv");
        assert_eq!(env.vars()["GANTRY_TEST_MULTI"], "a\nb");
    }

    #[test]
    fn test_parse_env_dump_keeps_equals_in_values() {
        let vars = parse_env_dump("A=1\0B=x=y\0\0");
        assert_eq!(
            vars,
            vec![("A".into(), "1".into()), ("B".into(), "x=y".into())]
        );
    }

    #[test]
    fn test_parse_dotenv() {
        let vars = parse_dotenv(
            "# database\nDB_NAME = site\n\n  DB_USER=admin  \nSECRET_KEY=a=b\nnot a pair\n",
        );
        assert_eq!(
            vars,
            vec![
                ("DB_NAME".into(), "site".into()),
                ("DB_USER".into(), "admin".into()),
                ("SECRET_KEY".into(), "a=b".into()),
            ]
        );
    }

    #[test]
    fn test_load_dotenv_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut env = Environment::new();
        assert_eq!(load_dotenv(&mut env, &dir.path().join(".env")).unwrap(), 0);
        assert!(env.vars().is_empty());
    }

    #[test]
    fn test_load_dotenv_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "DB_HOST=db.internal\n").unwrap();
        let mut env = Environment::new();
        env.set("DB_HOST", "localhost");

        assert_eq!(load_dotenv(&mut env, &path).unwrap(), 1);
        assert_eq!(env.get("DB_HOST").as_deref(), Some("db.internal"));
    }
}
