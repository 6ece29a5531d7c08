//! The deployment pipeline
//!
//! Stage names are ledger keys. Renaming one makes every existing ledger
//! re-run that stage.

pub mod django;
pub mod gunicorn;
pub mod nginx;
pub mod python;
pub mod services;
pub mod source;
pub mod system;

use crate::context::{DeployContext, DeployOptions};
use resumable::Pipeline;

pub const UPDATE_SYSTEM: &str = "update_system";
pub const INSTALL_APT_PACKAGES: &str = "install_apt_packages";
pub const CREATE_PROJECT_DIR: &str = "create_project_dir";
pub const CLONE_GIT_REPO: &str = "clone_git_repo";
pub const PULL_LATEST_CHANGES: &str = "pull_latest_changes";
pub const INSTALL_VIRTUALENV: &str = "install_create_activate_virtualenv";
pub const INSTALL_PROJECT_DEPENDENCIES: &str = "install_project_dependencies";
pub const MIGRATE_DATABASE: &str = "migrate_database";
pub const COLLECT_STATIC: &str = "collect_static";
pub const INSTALL_GUNICORN: &str = "install_gunicorn";
pub const WRITE_GUNICORN_CONFIG: &str = "write_gunicorn_config_files";
pub const SETUP_NGINX: &str = "setup_nginx";
pub const RESTART_SERVICES: &str = "restart_services";

/// Build the fixed deployment pipeline; `options` decides the optional gates
pub fn pipeline(options: &DeployOptions) -> Pipeline<DeployContext> {
    Pipeline::new()
        .stage(UPDATE_SYSTEM, system::update_system)
        .stage(INSTALL_APT_PACKAGES, system::install_apt_packages)
        .stage(CREATE_PROJECT_DIR, source::create_project_dir)
        .stage(CLONE_GIT_REPO, source::clone_git_repo)
        .every_run(PULL_LATEST_CHANGES, source::pull_latest_changes)
        .stage(INSTALL_VIRTUALENV, python::install_create_activate_virtualenv)
        .stage(INSTALL_PROJECT_DEPENDENCIES, python::install_project_dependencies)
        .optional(MIGRATE_DATABASE, options.migrate, django::migrate_database)
        .optional(COLLECT_STATIC, options.collectstatic, django::collect_static)
        .stage(INSTALL_GUNICORN, python::install_gunicorn)
        .stage(WRITE_GUNICORN_CONFIG, gunicorn::write_gunicorn_config_files)
        .stage(SETUP_NGINX, nginx::setup_nginx)
        .every_run(RESTART_SERVICES, services::restart_services)
}
