//! Command execution through a swappable process boundary
//!
//! Every external program the deployment touches (apt, git, pip,
//! systemctl, psql) is started through [`Executor::execute`]. The executor
//! adds the elevation prefix, applies the environment overlay, and turns a
//! non-zero exit into [`DeploymentError::CommandFailure`]. It makes exactly
//! one attempt per call and never times out: a hung child blocks the run.

use crate::environment::Environment;
use crate::error::{DeploymentError, Result};
use crate::sudo::{CARRIED_VARS, Elevation};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A fully resolved process launch
#[derive(Debug)]
pub struct Launch<'a> {
    pub argv: &'a [String],
    pub cwd: Option<&'a Path>,
    pub env: &'a BTreeMap<String, String>,
    pub capture: bool,
}

/// What came back from a launched process
#[derive(Debug, Clone, Default)]
pub struct Launched {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// Captured stdout (empty unless capture was requested)
    pub stdout: String,
}

/// The process boundary
///
/// [`SystemLauncher`] spawns real processes; tests substitute a recorder.
pub trait Launcher {
    fn launch(&self, launch: &Launch<'_>) -> io::Result<Launched>;
}

/// Launcher backed by `std::process::Command`, output streamed to the terminal
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, launch: &Launch<'_>) -> io::Result<Launched> {
        let (program, args) = launch
            .argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(launch.env)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = launch.cwd {
            cmd.current_dir(dir);
        }

        if launch.capture {
            let output = cmd.output()?;
            Ok(Launched {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        } else {
            let status = cmd.stdout(Stdio::inherit()).status()?;
            Ok(Launched {
                code: status.code(),
                stdout: String::new(),
            })
        }
    }
}

/// Per-call execution options
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Prefix the command with the elevation wrapper
    pub elevate: bool,
    /// Turn a non-zero exit into an error (otherwise the status is returned)
    pub fail_on_nonzero: bool,
    /// Capture stdout instead of streaming it
    pub capture: bool,
    /// Working directory for the child
    pub cwd: Option<PathBuf>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            elevate: false,
            fail_on_nonzero: true,
            capture: false,
            cwd: None,
        }
    }
}

impl ExecOptions {
    pub fn elevated() -> Self {
        Self {
            elevate: true,
            ..Self::default()
        }
    }

    /// Return non-zero exits to the caller instead of failing
    pub fn lenient(mut self) -> Self {
        self.fail_on_nonzero = false;
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The argv actually dispatched, elevation prefix included
    pub argv: Vec<String>,
    pub exit_status: Option<i32>,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }

    /// Captured stdout without surrounding whitespace
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs external commands with optional elevation
pub struct Executor {
    launcher: Box<dyn Launcher>,
    elevation: Elevation,
}

impl Executor {
    pub fn new(launcher: Box<dyn Launcher>, elevation: Elevation) -> Self {
        Self {
            launcher,
            elevation,
        }
    }

    /// Executor that spawns real processes
    pub fn system(elevation: Elevation) -> Self {
        Self::new(Box::new(SystemLauncher), elevation)
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    /// Run `argv` once and classify the result
    pub fn execute(
        &self,
        argv: &[&str],
        opts: &ExecOptions,
        env: &Environment,
    ) -> Result<CommandOutput> {
        let argv = if opts.elevate {
            let carried: Vec<String> = CARRIED_VARS
                .iter()
                .filter_map(|name| env.vars().get(*name).map(|value| format!("{name}={value}")))
                .collect();
            self.elevation.wrap(argv, &carried)
        } else {
            argv.iter().map(|s| (*s).to_string()).collect()
        };

        log::info!("$ {}", argv.join(" "));

        let launched = self
            .launcher
            .launch(&Launch {
                argv: &argv,
                cwd: opts.cwd.as_deref(),
                env: env.vars(),
                capture: opts.capture,
            })
            .map_err(|source| DeploymentError::Spawn {
                argv: argv.clone(),
                source,
            })?;

        if launched.code != Some(0) {
            if opts.fail_on_nonzero {
                return Err(DeploymentError::CommandFailure {
                    argv,
                    exit_status: launched.code,
                });
            }
            log::debug!("Ignoring exit status {:?} of {}", launched.code, argv.join(" "));
        }

        Ok(CommandOutput {
            argv,
            exit_status: launched.code,
            stdout: launched.stdout,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording launcher for tests

    use super::{Launch, Launched, Launcher};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::io;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// One recorded launch
    #[derive(Debug, Clone)]
    pub struct Call {
        pub argv: Vec<String>,
        pub cwd: Option<PathBuf>,
        pub env: BTreeMap<String, String>,
    }

    impl Call {
        pub fn line(&self) -> String {
            self.argv.join(" ")
        }
    }

    /// Shared view of everything a [`FakeLauncher`] was asked to run
    #[derive(Debug, Clone, Default)]
    pub struct CallLog(Rc<RefCell<Vec<Call>>>);

    impl CallLog {
        pub fn calls(&self) -> Vec<Call> {
            self.0.borrow().clone()
        }

        /// Each call's argv joined with spaces
        pub fn lines(&self) -> Vec<String> {
            self.0.borrow().iter().map(Call::line).collect()
        }

        pub fn len(&self) -> usize {
            self.0.borrow().len()
        }

        pub fn clear(&self) {
            self.0.borrow_mut().clear();
        }
    }

    struct Rule {
        needle: String,
        code: Option<i32>,
        stdout: String,
    }

    /// Records launches and answers from scripted rules (exit 0 by default)
    #[derive(Default)]
    pub struct FakeLauncher {
        log: CallLog,
        rules: Vec<Rule>,
    }

    impl FakeLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn log(&self) -> CallLog {
            self.log.clone()
        }

        /// Answer any argv whose joined form contains `needle`
        pub fn respond(mut self, needle: &str, code: Option<i32>, stdout: &str) -> Self {
            self.rules.push(Rule {
                needle: needle.to_string(),
                code,
                stdout: stdout.to_string(),
            });
            self
        }

        pub fn fail(self, needle: &str, code: i32) -> Self {
            self.respond(needle, Some(code), "")
        }
    }

    impl Launcher for FakeLauncher {
        fn launch(&self, launch: &Launch<'_>) -> io::Result<Launched> {
            let call = Call {
                argv: launch.argv.to_vec(),
                cwd: launch.cwd.map(|p| p.to_path_buf()),
                env: launch.env.clone(),
            };
            let line = call.line();
            self.log.0.borrow_mut().push(call);

            Ok(self
                .rules
                .iter()
                .find(|rule| line.contains(&rule.needle))
                .map(|rule| Launched {
                    code: rule.code,
                    stdout: rule.stdout.clone(),
                })
                .unwrap_or(Launched {
                    code: Some(0),
                    stdout: String::new(),
                }))
        }
    }
}
