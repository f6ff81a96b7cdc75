use rocket::{http::Status, serde::json::Json, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{authorization::Authorization, Api, ApiError, Message};
use concord_models::{
    db_conn::DbConn,
    users::{PasswordCost, ProfileUpdate, Signup, User},
    views::Profile,
};

#[post("/", data = "<data>")]
pub async fn create(
    conn: DbConn,
    cost: &State<PasswordCost>,
    data: Json<Signup>,
) -> Result<(Status, Json<Message>), ApiError> {
    let cost = **cost;
    let data = data.into_inner();
    let user = conn
        .run(move |c| {
            let new = data.into_new_user(cost)?;
            User::insert(c, new)
        })
        .await?;
    info!("New user: {}", user.username);
    Ok((Status::Created, Json(Message { message: "OK" })))
}

#[derive(Serialize)]
pub struct ProfileBody {
    pub user: Profile,
}

#[get("/me")]
pub async fn me(auth: Authorization, conn: DbConn) -> Api<ProfileBody> {
    let user_id = auth.user_id;
    let user = conn.run(move |c| User::get(c, user_id)).await?;
    auth.ok(ProfileBody { user: user.into() })
}

#[get("/<id>")]
pub async fn details(id: i32, auth: Authorization, conn: DbConn) -> Api<ProfileBody> {
    let user = conn.run(move |c| User::get(c, id)).await?;
    auth.ok(ProfileBody { user: user.into() })
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileData {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

/// Blank values mean "keep what I had".
fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl From<ProfileData> for ProfileUpdate {
    fn from(data: ProfileData) -> Self {
        ProfileUpdate {
            firstname: filled(data.firstname),
            lastname: filled(data.lastname),
            location: filled(data.location),
            profile_picture: filled(data.profile_picture),
            bio: filled(data.bio),
        }
    }
}

#[put("/me", data = "<data>")]
pub async fn update(auth: Authorization, conn: DbConn, data: Json<ProfileData>) -> Api<ProfileBody> {
    let user_id = auth.user_id;
    let changes = ProfileUpdate::from(data.into_inner());
    let user = conn
        .run(move |c| User::get(c, user_id)?.update_profile(c, changes))
        .await?;
    auth.reply(Status::Accepted, ProfileBody { user: user.into() })
}
