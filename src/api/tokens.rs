use rocket::{http::Status, serde::json::Json, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiError;
use concord_models::{db_conn::DbConn, tokens::TokenKeys, users::User};

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct Session {
    pub token: String,
    pub message: &'static str,
}

/// Logs a user in.
#[post("/", data = "<credentials>")]
pub async fn create(
    conn: DbConn,
    keys: &State<TokenKeys>,
    credentials: Json<Credentials>,
) -> Result<(Status, Json<Session>), ApiError> {
    let Credentials { email, password } = credentials.into_inner();
    let user = conn
        .run(move |c| User::login(c, email.trim(), &password))
        .await?;
    let token = keys.issue(user.id)?;
    info!("{} logged in", user.username);
    Ok((
        Status::Created,
        Json(Session {
            token,
            message: "OK",
        }),
    ))
}
