use crate::cli::DatabaseArgs;
use crate::config::Settings;
use crate::context::{DeployContext, DeployOptions};
use crate::database::{self, DbParams};
use crate::environment::Environment;
use crate::runner::Executor;
use crate::stages::django;
use crate::{sudo, ui};
use anyhow::Result;

use super::{elevation, require, resolve_layout};

pub fn run(args: DatabaseArgs) -> Result<()> {
    let settings = Settings::load()?;
    let layout = resolve_layout(&args.target)?;

    let params = DbParams {
        name: require(args.db_name, "Database name", "--db-name")?,
        user: require(args.db_user, "Database user", "--db-user")?,
        password: require(args.db_password, "Database password", "--db-password")?,
        host: args.db_host,
        port: args.db_port,
        timezone: args.timezone,
    };
    params.validate()?;
    let sql = params.sql();

    if args.no_execute_sql {
        ui::info("SQL execution disabled. Run the following to create the database:");
        ui::rule();
        println!("{sql}");
        ui::rule();
    } else {
        let exec = Executor::system(elevation(args.no_sudo, &settings));
        let env = Environment::new();
        sudo::preflight(&exec, &env, "running psql as the postgres user")?;

        let script = database::write_script(&layout.root, &sql)?;
        database::execute_script(&exec, &env, &script)?;
        ui::success(&format!(
            "Created database {} for {} ({}:{})",
            params.name, params.user, params.host, params.port
        ));
    }

    if args.migrate {
        let exec = Executor::system(elevation(args.no_sudo, &settings));
        let mut ctx = DeployContext::new(settings, layout, DeployOptions::default(), exec);
        django::migrate_database(&mut ctx)
            .map_err(|e| e.into_inner().context("Migration failed"))?;
        ui::success("Database migrated");
    }

    Ok(())
}
