//! Privilege elevation
//!
//! Stage bodies never build the `sudo` prefix themselves. They ask the
//! executor for an elevated run and the [`Elevation`] policy decides what
//! (if anything) goes in front of the argv.

use crate::environment::Environment;
use crate::error::Result;
use crate::runner::{ExecOptions, Executor};

/// Overlay variables re-exported inside elevated commands
///
/// `sudo` resets the environment before starting the target, so these are
/// passed as `env NAME=value` in the argv instead.
pub const CARRIED_VARS: &[&str] = &["DEBIAN_FRONTEND"];

/// Elevation wrapper applied to commands that need root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevation {
    program: Option<String>,
}

impl Elevation {
    /// Elevate with `sudo`
    #[cfg(test)]
    pub fn sudo() -> Self {
        Self::with_program("sudo")
    }

    /// Elevate with another wrapper (e.g. `doas`)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    /// Run "elevated" commands as the current user
    pub fn disabled() -> Self {
        Self { program: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.program.is_some()
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Prefix `argv` with the wrapper and `env` assignments for `carried`
    ///
    /// Disabled elevation returns `argv` unchanged; the child inherits the
    /// overlay directly in that case.
    pub fn wrap(&self, argv: &[&str], carried: &[String]) -> Vec<String> {
        let Some(program) = &self.program else {
            return argv.iter().map(|s| (*s).to_string()).collect();
        };

        let mut wrapped = vec![program.clone()];
        if !carried.is_empty() {
            wrapped.push("env".to_string());
            wrapped.extend(carried.iter().cloned());
        }
        wrapped.extend(argv.iter().map(|s| (*s).to_string()));
        wrapped
    }
}

/// Ask for the sudo password once, before any stage runs
///
/// Only `sudo` has a credential cache to warm; other wrappers are left alone.
pub fn preflight(exec: &Executor, env: &Environment, reason: &str) -> Result<()> {
    if exec.elevation().program() != Some("sudo") {
        return Ok(());
    }

    eprintln!();
    eprintln!("  Sudo required: {reason}");
    eprintln!();

    exec.execute(&["sudo", "-v"], &ExecOptions::default(), env)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeLauncher;

    #[test]
    fn test_wrap_prefixes_program() {
        assert_eq!(
            Elevation::sudo().wrap(&["apt", "update"], &[]),
            vec!["sudo", "apt", "update"]
        );
        assert_eq!(
            Elevation::with_program("doas").wrap(&["systemctl", "restart", "nginx"], &[]),
            vec!["doas", "systemctl", "restart", "nginx"]
        );
    }

    #[test]
    fn test_disabled_wrap_is_identity() {
        let elevation = Elevation::disabled();
        assert!(!elevation.is_enabled());
        assert_eq!(elevation.wrap(&["apt", "update"], &[]), vec!["apt", "update"]);
    }

    #[test]
    fn test_wrap_carries_env_assignments() {
        let carried = vec!["DEBIAN_FRONTEND=noninteractive".to_string()];
        assert_eq!(
            Elevation::sudo().wrap(&["apt", "install", "-y", "tzdata"], &carried),
            vec!["sudo", "env", "DEBIAN_FRONTEND=noninteractive", "apt", "install", "-y", "tzdata"]
        );
        assert_eq!(
            Elevation::sudo().wrap(&["apt", "update"], &[]),
            vec!["sudo", "apt", "update"]
        );
        assert_eq!(
            Elevation::disabled().wrap(&["apt", "update"], &carried),
            vec!["apt", "update"]
        );
    }

    #[test]
    fn test_preflight_validates_sudo_once() {
        let fake = FakeLauncher::new();
        let log = fake.log();
        let exec = Executor::new(Box::new(fake), Elevation::sudo());

        preflight(&exec, &Environment::new(), "install packages").unwrap();
        assert_eq!(log.lines(), vec!["sudo -v"]);
    }

    #[test]
    fn test_preflight_skipped_without_sudo() {
        let fake = FakeLauncher::new();
        let log = fake.log();

        let exec = Executor::new(Box::new(fake), Elevation::disabled());
        preflight(&exec, &Environment::new(), "install packages").unwrap();

        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_preflight_failure_is_reported() {
        let exec = Executor::new(Box::new(FakeLauncher::new().fail("sudo -v", 1)), Elevation::sudo());
        assert!(preflight(&exec, &Environment::new(), "x").is_err());
    }
}
