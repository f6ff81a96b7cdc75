use std::env::var;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

pub struct Config {
    pub database_url: String,
    pub db_max_size: Option<u32>,
    pub jwt_secret: String,
    pub token_lifetime: i64,
    pub bcrypt_cost: u32,
}

fn try_load<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid {} value ({}), using the default", key, e);
            default
        }),
        Err(_) => default,
    }
}

fn get_jwt_secret() -> String {
    match var("JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            if cfg!(debug_assertions) {
                warn!("JWT_SECRET is not set, using an insecure development secret");
                String::from("concord-development-secret")
            } else {
                panic!("JWT_SECRET must be set in production")
            }
        }
    }
}

lazy_static! {
    pub static ref CONFIG: Config = {
        dotenv::dotenv().ok();
        let config = Config {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|_| String::from("concord.sqlite3")),
            db_max_size: var("DB_MAX_SIZE").ok().and_then(|s| s.parse().ok()),
            jwt_secret: get_jwt_secret(),
            token_lifetime: try_load("TOKEN_LIFETIME", 600),
            bcrypt_cost: try_load("BCRYPT_COST", bcrypt::DEFAULT_COST),
        };
        info!("Configuration loaded for {}", config.database_url);
        config
    };
}
