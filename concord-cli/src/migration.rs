use clap::{ArgMatches, Command};
use tracing::info;

use concord_models::{migrations, Connection, Error, Result};

pub fn command() -> Command {
    Command::new("migration")
        .about("Manage migrations")
        .subcommand_required(true)
        .subcommand(Command::new("run").about("Run migrations"))
}

pub fn run(args: &ArgMatches, conn: &mut Connection) -> Result<()> {
    match args.subcommand() {
        Some(("run", _)) => run_pending(conn),
        _ => Err(Error::InvalidValue(String::from("unknown migration command"))),
    }
}

fn run_pending(conn: &mut Connection) -> Result<()> {
    if !migrations::is_pending(conn)? {
        info!("The database is already up to date");
        return Ok(());
    }
    migrations::run_pending(conn)
}
