use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::{self, Write};
use tracing::info;

use concord_models::{
    users::{PasswordCost, Signup, User},
    Connection, Error, Result, CONFIG,
};

pub fn command() -> Command {
    Command::new("users")
        .about("Manage users")
        .subcommand_required(true)
        .subcommand(
            Command::new("new")
                .about("Create a new user")
                .arg(
                    Arg::new("username")
                        .short('n')
                        .long("username")
                        .required(true)
                        .help("The username of the new user"),
                )
                .arg(
                    Arg::new("email")
                        .short('m')
                        .long("email")
                        .required(true)
                        .help("Their email"),
                )
                .arg(Arg::new("firstname").long("firstname"))
                .arg(Arg::new("lastname").long("lastname"))
                .arg(Arg::new("location").long("location"))
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("The password of the new user. Asked for when omitted."),
                ),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Set a new password for a user")
                .arg(
                    Arg::new("email")
                        .short('m')
                        .long("email")
                        .required(true)
                        .help("The email of the user"),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("The new password. Asked for when omitted."),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a user, along with everything they published")
                .arg(
                    Arg::new("username")
                        .short('n')
                        .long("username")
                        .required(true)
                        .help("The username of the user to delete"),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Don't ask for confirmation"),
                ),
        )
}

pub fn run(args: &ArgMatches, conn: &mut Connection) -> Result<()> {
    let cost = PasswordCost(CONFIG.bcrypt_cost);
    match args.subcommand() {
        Some(("new", args)) => new(args, conn, cost),
        Some(("reset-password", args)) => reset_password(args, conn, cost),
        Some(("delete", args)) => delete(args, conn),
        _ => Err(Error::InvalidValue(String::from("unknown users command"))),
    }
}

fn arg(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

fn password(args: &ArgMatches) -> Result<String> {
    match args.get_one::<String>("password") {
        Some(password) => Ok(password.clone()),
        None => rpassword::prompt_password("Password: ")
            .map_err(|e| Error::InvalidValue(format!("couldn't read the password: {}", e))),
    }
}

fn new(args: &ArgMatches, conn: &mut Connection, cost: PasswordCost) -> Result<()> {
    let signup = Signup {
        email: arg(args, "email"),
        password: password(args)?,
        username: arg(args, "username"),
        firstname: arg(args, "firstname"),
        lastname: arg(args, "lastname"),
        location: arg(args, "location"),
        profile_picture: String::new(),
    };
    let user = User::insert(conn, signup.into_new_user(cost)?)?;
    info!("Created user {} ({})", user.username, user.id);
    Ok(())
}

fn reset_password(args: &ArgMatches, conn: &mut Connection, cost: PasswordCost) -> Result<()> {
    let user = User::find_by_email(conn, &arg(args, "email"))?;
    let password = password(args)?;
    user.reset_password(conn, User::hash_pass(&password, cost)?)
}

fn delete(args: &ArgMatches, conn: &mut Connection) -> Result<()> {
    let user = User::find_by_username(conn, &arg(args, "username"))?;
    if !args.get_flag("yes") && !confirm(&user)? {
        info!("Nothing was deleted");
        return Ok(());
    }
    user.delete(conn)
}

fn confirm(user: &User) -> Result<bool> {
    print!(
        "Delete {} ({}) and everything they published? [y/N] ",
        user.username, user.email
    );
    let mut answer = String::new();
    io::stdout()
        .flush()
        .and_then(|_| io::stdin().read_line(&mut answer))
        .map_err(|e| Error::InvalidValue(format!("couldn't read the answer: {}", e)))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
