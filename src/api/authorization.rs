use rocket::{
    http::Status,
    outcome::{try_outcome, Outcome},
    request::{self, FromRequest, Request},
    serde::json::Json,
    State,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::api::{Api, Signed};
use concord_models::tokens::TokenKeys;

/// The user a request was made by, proven by a valid bearer token.
///
/// Getting this guard also issues the token that will be sent back with the
/// response.
pub struct Authorization {
    pub user_id: i32,
    renewed: String,
}

impl Authorization {
    pub fn reply<T: Serialize>(self, status: Status, body: T) -> Api<T> {
        Ok((
            status,
            Json(Signed {
                body,
                token: self.renewed,
            }),
        ))
    }

    pub fn ok<T: Serialize>(self, body: T) -> Api<T> {
        self.reply(Status::Ok, body)
    }
}

fn bearer<'a>(request: &'a Request<'_>) -> Option<&'a str> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Authorization {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let keys = try_outcome!(request.guard::<&State<TokenKeys>>().await);
        let claims = match bearer(request).map(|token| keys.verify(token)) {
            Some(Ok(claims)) => claims,
            Some(Err(e)) => {
                debug!("Rejected token: {}", e);
                return Outcome::Error((Status::Unauthorized, ()));
            }
            None => return Outcome::Error((Status::Unauthorized, ())),
        };
        match keys.issue(claims.user_id) {
            Ok(renewed) => Outcome::Success(Authorization {
                user_id: claims.user_id,
                renewed,
            }),
            Err(e) => {
                error!("Couldn't renew the token of {}: {}", claims.user_id, e);
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
