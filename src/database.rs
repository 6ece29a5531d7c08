//! PostgreSQL database and role provisioning
//!
//! The script is plain SQL with the names interpolated directly, so names
//! are restricted to bare identifiers and the password may not contain a
//! single quote.

use crate::environment::Environment;
use crate::error::{DeploymentError, Result};
use crate::runner::{CommandOutput, ExecOptions, Executor};
use regex::Regex;
use resumable::Ledger;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Script file name inside the artifacts directory
pub const SCRIPT_FILE: &str = "create_db.sql";

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbParams {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub timezone: String,
}

impl DbParams {
    /// Reject values that would break out of the generated statements
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [("database name", &self.name), ("database user", &self.user)] {
            if !IDENTIFIER.is_match(value) {
                return Err(DeploymentError::InvalidInput(format!(
                    "{label} '{value}' must be a plain identifier (letters, digits, '_')"
                )));
            }
        }
        if self.password.is_empty() {
            return Err(DeploymentError::InvalidInput(
                "database password must not be empty".to_string(),
            ));
        }
        if self.password.contains('\'') {
            return Err(DeploymentError::InvalidInput(
                "database password must not contain a single quote".to_string(),
            ));
        }
        if self.timezone.contains('\'') {
            return Err(DeploymentError::InvalidInput(format!(
                "invalid timezone '{}'",
                self.timezone
            )));
        }
        Ok(())
    }

    /// The provisioning script
    pub fn sql(&self) -> String {
        let (db, user) = (&self.name, &self.user);
        [
            format!("CREATE DATABASE {db};"),
            format!("CREATE USER {user} WITH PASSWORD '{}';", self.password),
            format!("ALTER ROLE {user} SET client_encoding TO 'utf8';"),
            format!("ALTER ROLE {user} SET default_transaction_isolation TO 'read committed';"),
            format!("ALTER ROLE {user} SET timezone TO '{}';", self.timezone),
            format!("GRANT ALL PRIVILEGES ON DATABASE {db} TO {user};"),
            format!("ALTER ROLE {user} SUPERUSER;"),
        ]
        .join("\n")
    }
}

/// Where the script is written for a deployment root
pub fn script_path(root: &Path) -> PathBuf {
    Ledger::artifacts_dir(root).join(SCRIPT_FILE)
}

/// Write `sql` to the artifacts directory, replacing any previous script
///
/// The file is made world-readable and writable so the `postgres` user
/// can read it after the switch.
pub fn write_script(root: &Path, sql: &str) -> Result<PathBuf> {
    let path = script_path(root);
    let write_err = |source: std::io::Error| DeploymentError::FileWrite {
        path: path.clone(),
        source,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(write_err)?;
    }
    if path.exists() {
        fs::remove_file(&path).map_err(write_err)?;
    }
    fs::write(&path, sql).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o777)).map_err(write_err)?;
    }

    log::info!("Wrote {}", path.display());
    Ok(path)
}

/// Join `argv` into a single command line for `su -c`
fn shell_command(argv: &[&str]) -> String {
    shell_words::join(argv)
}

/// Run the script as the `postgres` system user
pub fn execute_script(exec: &Executor, env: &Environment, script: &Path) -> Result<CommandOutput> {
    let path = script.to_string_lossy();
    let psql = shell_command(&["psql", "-f", &*path]);
    exec.execute(&["su", "postgres", "-c", psql.as_str()], &ExecOptions::elevated(), env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeLauncher;
    use crate::sudo::Elevation;
    use tempfile::TempDir;

    fn params() -> DbParams {
        DbParams {
            name: "site_db".to_string(),
            user: "site_user".to_string(),
            password: "s3cret".to_string(),
            host: "localhost".to_string(),
            port: "5432".to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    #[test]
    fn test_sql_statements() {
        assert_eq!(
            params().sql(),
            "CREATE DATABASE site_db;\n\
             CREATE USER site_user WITH PASSWORD 's3cret';\n\
             ALTER ROLE site_user SET client_encoding TO 'utf8';\n\
             ALTER ROLE site_user SET default_transaction_isolation TO 'read committed';\n\
             ALTER ROLE site_user SET timezone TO 'Asia/Kolkata';\n\
             GRANT ALL PRIVILEGES ON DATABASE site_db TO site_user;\n\
             ALTER ROLE site_user SUPERUSER;"
        );
    }

    #[test]
    fn test_custom_timezone() {
        let mut p = params();
        p.timezone = "UTC".to_string();
        assert!(p.sql().contains("SET timezone TO 'UTC';"));
    }

    #[test]
    fn test_validate() {
        assert!(params().validate().is_ok());

        let mut p = params();
        p.name = "site; DROP TABLE x".to_string();
        assert!(matches!(p.validate(), Err(DeploymentError::InvalidInput(_))));

        let mut p = params();
        p.user = "1user".to_string();
        assert!(p.validate().is_err());

        let mut p = params();
        p.password = "it's".to_string();
        assert!(p.validate().is_err());

        let mut p = params();
        p.password.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_write_script_replaces_previous() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "old").unwrap();
        let path = write_script(dir.path(), "new").unwrap();

        assert_eq!(path, dir.path().join(".deployment_artifacts/create_db.sql"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o777);
        }
    }

    #[test]
    fn test_execute_runs_psql_as_postgres() {
        let fake = FakeLauncher::new();
        let log = fake.log();
        let exec = Executor::new(Box::new(fake), Elevation::sudo());

        execute_script(&exec, &Environment::new(), Path::new("/srv/.deployment_artifacts/create_db.sql"))
            .unwrap();

        let call = &log.calls()[0];
        assert_eq!(
            call.argv,
            vec![
                "sudo",
                "su",
                "postgres",
                "-c",
                "psql -f /srv/.deployment_artifacts/create_db.sql"
            ]
        );
    }

    #[test]
    fn test_script_path_with_space_is_quoted() {
        let fake = FakeLauncher::new();
        let log = fake.log();
        let exec = Executor::new(Box::new(fake), Elevation::sudo());

        execute_script(&exec, &Environment::new(), Path::new("/srv/my apps/create_db.sql")).unwrap();

        assert_eq!(log.calls()[0].argv[4], "psql -f '/srv/my apps/create_db.sql'");
    }

    #[test]
    fn test_quoted_script_path_survives_the_shell() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("my apps; echo $HOME");
        let script = write_script(&root, "SELECT 1;").unwrap();
        let path = script.to_string_lossy();

        // cat in place of psql, under the same kind of shell su starts
        let command = shell_command(&["cat", &*path]);
        let exec = Executor::system(Elevation::disabled());
        let out = exec
            .execute(&["sh", "-c", command.as_str()], &ExecOptions::default().capture(), &Environment::new())
            .unwrap();

        assert_eq!(out.stdout, "SELECT 1;");
    }
}
