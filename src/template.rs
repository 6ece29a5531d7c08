//! Config file templating
//!
//! Templates are plain text with `{{NAME}}` tokens. Substitution is a
//! literal replace per entry, applied in the order given; nothing is
//! escaped or evaluated.

use crate::error::{DeploymentError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder names understood by the bundled templates
pub struct Placeholders;

impl Placeholders {
    pub const USER: &'static str = "USER";
    pub const GROUP: &'static str = "GROUP";
    pub const APP_NAME: &'static str = "APP_NAME";
    pub const PROJECT_PATH: &'static str = "PROJECT_PATH";
    pub const GUNICORN_PATH: &'static str = "GUNICORN_PATH";
    pub const DOMAIN_NAME: &'static str = "DOMAIN_NAME";
}

/// Token for a placeholder name: `USER` becomes `{{USER}}`
pub fn token(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// Substitute placeholders in already-loaded template text
pub fn render_str(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (name, value) in substitutions {
        result = result.replace(&token(name), value);
    }

    result
}

/// Load a template file and substitute placeholders
pub fn render(path: &Path, substitutions: &[(&str, &str)]) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|source| DeploymentError::TemplateRender {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(render_str(&text, substitutions))
}

/// The templates a deployment writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    GunicornSocket,
    GunicornService,
    Nginx,
}

impl Template {
    /// File name inside a templates directory
    pub fn file_name(self) -> &'static str {
        match self {
            Self::GunicornSocket => "gunicorn.socket",
            Self::GunicornService => "gunicorn.service",
            Self::Nginx => "nginx.conf",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            Self::GunicornSocket => include_str!("../templates/gunicorn.socket"),
            Self::GunicornService => include_str!("../templates/gunicorn.service"),
            Self::Nginx => include_str!("../templates/nginx.conf"),
        }
    }

    /// Render from `templates_dir` when one is configured, else the bundled copy
    ///
    /// A configured directory is authoritative: a missing file there is an
    /// error rather than a silent fallback.
    pub fn render(
        self,
        templates_dir: Option<&Path>,
        substitutions: &[(&str, &str)],
    ) -> Result<String> {
        match templates_dir {
            Some(dir) => render(&self.path_in(dir), substitutions),
            None => Ok(render_str(self.builtin(), substitutions)),
        }
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}
