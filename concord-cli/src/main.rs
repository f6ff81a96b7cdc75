use clap::Command;
use std::process::exit;
use tracing::error;
use tracing_subscriber::EnvFilter;

use concord_models::{db_conn::init_configured_pool, Error, Result, CONFIG};

mod migration;
mod users;

fn command() -> Command {
    Command::new("concord-cli")
        .bin_name("concord-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collection of tools to manage your Concord instance.")
        .subcommand_required(true)
        .subcommand(migration::command())
        .subcommand(users::command())
}

fn run() -> Result<()> {
    let matches = command().get_matches();
    let pool = init_configured_pool()?;
    let mut conn = pool.get()?;
    match matches.subcommand() {
        Some(("migration", args)) => migration::run(args, &mut conn),
        Some(("users", args)) => users::run(args, &mut conn),
        _ => Err(Error::InvalidValue(String::from("unknown command"))),
    }
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        error!("Failed on {}: {}", CONFIG.database_url, e);
        exit(1);
    }
}
