use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Resumable single-host deployment for Django apps behind gunicorn and nginx", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the host and deploy a project, resuming after the last completed stage
    Deploy(DeployArgs),

    /// Create the PostgreSQL database and role for a project
    Database(DatabaseArgs),

    /// Show which stages are recorded complete under a root
    Status(StatusArgs),

    /// List the deployment stages in order
    Stages(GateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Deployment root and project, prompted for when missing
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Directory holding project files and the stage ledger
    #[arg(long, env = "GANTRY_ROOT")]
    pub root_path: Option<String>,

    /// Project name (deployment target key)
    #[arg(long)]
    pub project_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GateArgs {
    /// Run database migrations
    #[arg(long)]
    pub migrate: bool,

    /// Skip collecting static files
    #[arg(long)]
    pub no_collectstatic: bool,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Git repository URL
    #[arg(long)]
    pub git_repo: Option<String>,

    /// Branch to clone (defaults to the configured branch)
    #[arg(long)]
    pub git_branch: Option<String>,

    /// Domain served by nginx (defaults to this host's public IP)
    #[arg(long)]
    pub domain_name: Option<String>,

    /// Run privileged commands without sudo (e.g. when already root)
    #[arg(long)]
    pub no_sudo: bool,

    #[command(flatten)]
    pub gates: GateArgs,
}

#[derive(Args, Debug)]
pub struct DatabaseArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Database name
    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Database user
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database host
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port
    #[arg(long, env = "DB_PORT", default_value = "5432")]
    pub db_port: String,

    /// Timezone set on the role
    #[arg(long, default_value = crate::database::DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// Print the SQL instead of running it
    #[arg(long)]
    pub no_execute_sql: bool,

    /// Run `manage.py migrate` from the project virtualenv afterwards
    #[arg(long)]
    pub migrate: bool,

    /// Run privileged commands without sudo
    #[arg(long)]
    pub no_sudo: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory holding the stage ledger
    #[arg(long, env = "GANTRY_ROOT")]
    pub root_path: String,

    /// Only show this project
    #[arg(long)]
    pub project_name: Option<String>,
}
