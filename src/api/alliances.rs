use rocket::{http::Status, serde::json::Json};
use serde::{Deserialize, Serialize};

use crate::api::{authorization::Authorization, Api};
use concord_models::{
    alliances::{Alliance, AllianceRole, AllianceStatus},
    db_conn::DbConn,
    users::User,
    views::{Candidate, UserSummary},
};

#[derive(Serialize)]
pub struct AllianceBody {
    pub alliance: Alliance,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllianceWithRole {
    pub alliance: Alliance,
    pub alliance_role: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRequests {
    pub received_requests: Vec<Alliance>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requesters {
    pub users_that_requested: Vec<UserSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidates {
    pub users_with_alliances_data: Vec<Candidate>,
}

#[derive(Serialize)]
pub struct Allies {
    pub alliances: Vec<UserSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlliesQuery {
    pub user_id: i32,
}

fn summaries(users: Vec<User>) -> Vec<UserSummary> {
    users.iter().map(UserSummary::from).collect()
}

#[post("/<id>")]
pub async fn request(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceBody> {
    let user_id = auth.user_id;
    let alliance = conn
        .run(move |c| Alliance::request(c, user_id, id))
        .await?;
    auth.reply(Status::Created, AllianceBody { alliance })
}

#[post("/<id>/cancel")]
pub async fn cancel(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceBody> {
    let user_id = auth.user_id;
    let alliance = conn.run(move |c| Alliance::cancel(c, user_id, id)).await?;
    auth.ok(AllianceBody { alliance })
}

#[post("/<id>/forge")]
pub async fn forge(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceBody> {
    let user_id = auth.user_id;
    let alliance = conn.run(move |c| Alliance::forge(c, user_id, id)).await?;
    auth.ok(AllianceBody { alliance })
}

#[post("/<id>/reject")]
pub async fn reject(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceBody> {
    let user_id = auth.user_id;
    let alliance = conn.run(move |c| Alliance::reject(c, user_id, id)).await?;
    auth.ok(AllianceBody { alliance })
}

#[post("/<id>/dissolve")]
pub async fn dissolve(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceBody> {
    let user_id = auth.user_id;
    let alliance = conn
        .run(move |c| Alliance::dissolve(c, user_id, id))
        .await?;
    auth.ok(AllianceBody { alliance })
}

#[get("/<id>/receivedRequestsAdmin")]
pub async fn received_requests_admin(
    id: i32,
    auth: Authorization,
    conn: DbConn,
) -> Api<ReceivedRequests> {
    let received_requests = conn
        .run(move |c| Alliance::list_received(c, id, AllianceStatus::Pending))
        .await?;
    auth.ok(ReceivedRequests { received_requests })
}

#[get("/<id>/find")]
pub async fn find(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceBody> {
    let alliance = conn.run(move |c| Alliance::get(c, id)).await?;
    auth.ok(AllianceBody { alliance })
}

#[get("/<id>/findAllianceWithUserRole")]
pub async fn find_with_role(id: i32, auth: Authorization, conn: DbConn) -> Api<AllianceWithRole> {
    let alliance = conn.run(move |c| Alliance::get(c, id)).await?;
    let alliance_role = match alliance.role_of(auth.user_id) {
        Some(AllianceRole::Sender) => "sender",
        Some(AllianceRole::Receiver) => "receiver",
        None => "none",
    };
    auth.ok(AllianceWithRole {
        alliance,
        alliance_role,
    })
}

#[get("/viewReceivedRequests")]
pub async fn received_requests(auth: Authorization, conn: DbConn) -> Api<Requesters> {
    let user_id = auth.user_id;
    let senders = conn
        .run(move |c| Alliance::pending_senders(c, user_id))
        .await?;
    auth.ok(Requesters {
        users_that_requested: summaries(senders),
    })
}

#[get("/viewPotentialAlliances")]
pub async fn potential_alliances(auth: Authorization, conn: DbConn) -> Api<Candidates> {
    let user_id = auth.user_id;
    let users_with_alliances_data = conn
        .run(move |c| Alliance::candidates(c, user_id))
        .await?
        .iter()
        .map(|(user, alliance)| Candidate::new(user_id, user, alliance.as_ref()))
        .collect();
    auth.ok(Candidates {
        users_with_alliances_data,
    })
}

#[get("/viewForgedAlliances")]
pub async fn forged_alliances(auth: Authorization, conn: DbConn) -> Api<Allies> {
    let user_id = auth.user_id;
    let allies = conn.run(move |c| Alliance::allies(c, user_id)).await?;
    auth.ok(Allies {
        alliances: summaries(allies),
    })
}

#[post("/viewSpecificAlliances", data = "<query>")]
pub async fn specific_alliances(
    auth: Authorization,
    conn: DbConn,
    query: Json<AlliesQuery>,
) -> Api<Allies> {
    let user_id = query.user_id;
    let allies = conn
        .run(move |c| {
            let user = User::get(c, user_id)?;
            Alliance::allies(c, user.id)
        })
        .await?;
    auth.ok(Allies {
        alliances: summaries(allies),
    })
}
