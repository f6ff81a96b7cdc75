#[macro_use]
extern crate rocket;

use rocket::{Build, Rocket};
use std::process::exit;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use concord_models::{
    db_conn::{init_configured_pool, DbPool},
    migrations,
    tokens::TokenKeys,
    users::PasswordCost,
    CONFIG,
};

mod api;
#[cfg(test)]
mod testing;

/// Builds the server around an existing pool, so that tests can bring their
/// own database and keys.
pub fn init_rocket(pool: DbPool, keys: TokenKeys, cost: PasswordCost) -> Rocket<Build> {
    rocket::build()
        .mount(
            "/users",
            routes![
                api::users::create,
                api::users::me,
                api::users::details,
                api::users::update,
            ],
        )
        .mount("/tokens", routes![api::tokens::create])
        .mount(
            "/posts",
            routes![
                api::posts::list,
                api::posts::list_by_user,
                api::posts::create,
                api::posts::update,
                api::posts::delete,
            ],
        )
        .mount(
            "/comments",
            routes![
                api::comments::create,
                api::comments::update,
                api::comments::delete,
            ],
        )
        .mount(
            "/likes",
            routes![api::likes::toggle_post, api::likes::toggle_comment],
        )
        .mount(
            "/alliances",
            routes![
                api::alliances::request,
                api::alliances::cancel,
                api::alliances::forge,
                api::alliances::reject,
                api::alliances::dissolve,
                api::alliances::received_requests_admin,
                api::alliances::find,
                api::alliances::find_with_role,
                api::alliances::received_requests,
                api::alliances::potential_alliances,
                api::alliances::forged_alliances,
                api::alliances::specific_alliances,
            ],
        )
        .register(
            "/",
            catchers![
                api::bad_request,
                api::unauthorized,
                api::not_found,
                api::unprocessable_entity,
                api::default_catcher,
            ],
        )
        .manage(pool)
        .manage(keys)
        .manage(cost)
}

#[rocket::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pool = match init_configured_pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Couldn't open the database at {}: {}", CONFIG.database_url, e);
            exit(1);
        }
    };
    let pending = pool
        .get()
        .map_err(Into::into)
        .and_then(|mut conn| migrations::is_pending(&mut conn));
    if pending.unwrap_or(true) {
        error!(
            "The database is not up to date. Run the migrations with \
             `concord-cli migration run`, then start the server again."
        );
        exit(1);
    }

    info!("Starting Concord");
    let rocket = init_rocket(
        pool,
        TokenKeys::from_config(),
        PasswordCost(CONFIG.bcrypt_cost),
    );
    if let Err(e) = rocket.launch().await {
        error!("Server stopped: {}", e);
        exit(1);
    }
}
