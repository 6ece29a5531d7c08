//! Deployment context threaded through every stage body

use crate::config::Settings;
use crate::environment::{self, Environment, VIRTUAL_ENV};
use crate::error::{DeploymentError, Result};
use crate::runner::{CommandOutput, ExecOptions, Executor};
use regex::Regex;
use resumable::Ledger;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("valid regex"));

/// Check a project name is usable as a directory, site file and ledger key
pub fn validate_project_name(name: &str) -> Result<()> {
    if PROJECT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(DeploymentError::InvalidInput(format!(
            "project name '{name}' must start with a letter, digit or underscore \
             and contain only letters, digits, '_', '.' and '-'"
        )))
    }
}

/// Filesystem layout of one deployment under a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub project_name: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, project_name: &str) -> Result<Self> {
        validate_project_name(project_name)?;
        Ok(Self {
            root: root.into(),
            project_name: project_name.to_string(),
        })
    }

    /// `<root>/<project>/<project>`, where the repository is cloned
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(&self.project_name).join(&self.project_name)
    }

    /// `<root>/<project>/venv`
    pub fn venv_dir(&self) -> PathBuf {
        self.root.join(&self.project_name).join("venv")
    }

    pub fn activate_script(&self) -> PathBuf {
        self.venv_dir().join("bin").join("activate")
    }

    pub fn manage_py(&self) -> PathBuf {
        self.project_dir().join("manage.py")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        Ledger::artifacts_dir(&self.root)
    }

    /// Staging area for files installed into privileged directories
    pub fn rendered_dir(&self) -> PathBuf {
        self.artifacts_dir().join("rendered")
    }
}

/// Per-run deploy choices from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub repo_url: String,
    pub branch: String,
    pub domain: Option<String>,
    pub migrate: bool,
    pub collectstatic: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            branch: "master".to_string(),
            domain: None,
            migrate: false,
            collectstatic: true,
        }
    }
}

/// Everything a stage body may touch
pub struct DeployContext {
    pub settings: Settings,
    pub layout: Layout,
    pub options: DeployOptions,
    pub exec: Executor,
    pub env: Environment,
}

impl DeployContext {
    pub fn new(settings: Settings, layout: Layout, options: DeployOptions, exec: Executor) -> Self {
        let mut env = Environment::new();
        env.set("DEBIAN_FRONTEND", "noninteractive");
        Self {
            settings,
            layout,
            options,
            exec,
            env,
        }
    }

    /// Run a command as the current user with the overlay applied
    pub fn run(&self, argv: &[&str]) -> Result<CommandOutput> {
        self.exec.execute(argv, &ExecOptions::default(), &self.env)
    }

    pub fn run_with(&self, argv: &[&str], opts: &ExecOptions) -> Result<CommandOutput> {
        self.exec.execute(argv, opts, &self.env)
    }

    /// Run a command through the elevation wrapper
    pub fn run_elevated(&self, argv: &[&str]) -> Result<CommandOutput> {
        self.exec.execute(argv, &ExecOptions::elevated(), &self.env)
    }

    /// Activate the project virtualenv (once per run)
    pub fn activate(&mut self) -> Result<()> {
        let script = self.layout.activate_script();
        environment::import_from_script(&mut self.env, &self.exec, &script, VIRTUAL_ENV)?;
        Ok(())
    }

    /// Stage `content` under the artifacts dir and install it at `dest`
    ///
    /// The copy into `dest` goes through the elevation path so system
    /// directories can be written without running gantry as root.
    pub fn install_file(&self, content: &str, dest: &Path) -> Result<()> {
        let staged_dir = self.layout.rendered_dir();
        fs::create_dir_all(&staged_dir).map_err(|source| DeploymentError::FileWrite {
            path: staged_dir.clone(),
            source,
        })?;

        let file_name = dest
            .file_name()
            .ok_or_else(|| DeploymentError::InvalidInput(format!("not a file path: {}", dest.display())))?;
        let staged = staged_dir.join(file_name);
        fs::write(&staged, content).map_err(|source| DeploymentError::FileWrite {
            path: staged.clone(),
            source,
        })?;

        let staged_arg = staged.to_string_lossy().into_owned();
        let dest_arg = dest.to_string_lossy().into_owned();
        self.run_elevated(&["install", "-m", "0644", staged_arg.as_str(), dest_arg.as_str()])?;
        log::info!("Installed {}", dest.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::runner::testing::{CallLog, FakeLauncher};
    use crate::sudo::Elevation;

    /// Context over `root` whose commands go to `fake`
    pub fn context(root: &Path, fake: FakeLauncher) -> (DeployContext, CallLog) {
        let log = fake.log();
        let exec = Executor::new(Box::new(fake), Elevation::sudo());
        let layout = Layout::new(root, "site").unwrap();
        let options = DeployOptions {
            repo_url: "https://example.com/site.git".to_string(),
            domain: Some("example.com".to_string()),
            ..DeployOptions::default()
        };
        let mut settings = Settings::default();
        settings.service_user = Some("deploy".to_string());
        settings.systemd_dir = root.join("etc/systemd/system");
        settings.nginx_sites_available = root.join("etc/nginx/sites-available");
        settings.nginx_sites_enabled = root.join("etc/nginx/sites-enabled");
        (DeployContext::new(settings, layout, options, exec), log)
    }

    /// NUL-separated `env -0` output of an activated virtualenv
    pub fn activated_env(venv: &Path) -> String {
        format!(
            "VIRTUAL_ENV={}\0PATH={}/bin:/usr/bin\0",
            venv.display(),
            venv.display()
        )
    }
}
