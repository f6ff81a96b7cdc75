use rocket::{
    http::Status,
    request::Request,
    response::{self, Responder},
    serde::json::Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};
use validator::ValidationErrors;

use concord_models::Error;

pub mod alliances;
pub mod authorization;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod tokens;
pub mod users;

#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> ApiError {
        ApiError(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> ApiError {
        ApiError(Error::Validation(errors.to_string()))
    }
}

impl ApiError {
    fn status(&self) -> Status {
        match self.0 {
            Error::NotFound => Status::NotFound,
            Error::Unauthorized | Error::InvalidToken(_) => Status::Unauthorized,
            Error::Forbidden => Status::Forbidden,
            Error::Conflict(_) => Status::Conflict,
            Error::Validation(_) | Error::InvalidValue(_) => Status::BadRequest,
            Error::Pool(_) => Status::ServiceUnavailable,
            _ => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = if status == Status::InternalServerError {
            error!("{} {} failed: {}", req.method(), req.uri(), self.0);
            String::from("Something went wrong")
        } else if status == Status::Unauthorized {
            String::from("auth error")
        } else {
            debug!("{} {}: {}", req.method(), req.uri(), self.0);
            self.0.to_string()
        };
        (status, Json(json!({ "message": message }))).respond_to(req)
    }
}

/// A response body, along with a fresh token for the client to use next.
#[derive(Serialize)]
pub struct Signed<T> {
    #[serde(flatten)]
    pub body: T,
    pub token: String,
}

pub type Api<T> = Result<(Status, Json<Signed<T>>), ApiError>;

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[catch(400)]
pub fn bad_request() -> Json<Value> {
    Json(json!({ "message": "Bad request" }))
}

#[catch(401)]
pub fn unauthorized() -> Json<Value> {
    Json(json!({ "message": "auth error" }))
}

#[catch(404)]
pub fn not_found() -> Json<Value> {
    Json(json!({ "message": "Not found" }))
}

#[catch(422)]
pub fn unprocessable_entity() -> Json<Value> {
    Json(json!({ "message": "Invalid payload" }))
}

#[catch(default)]
pub fn default_catcher(status: Status, _req: &Request<'_>) -> Json<Value> {
    Json(json!({ "message": status.reason().unwrap_or("Unknown error") }))
}
