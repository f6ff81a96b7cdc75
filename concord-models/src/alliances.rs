//! Alliances are the friendships of Concord.
//!
//! One user sends a request, which stays `pending` until the receiver forges
//! or rejects it. The sender may cancel a pending request, and either side may
//! dissolve an accepted alliance. Rejecting, cancelling and dissolving all
//! delete the row: there is no "rejected" state, and a new request can be sent
//! afterwards.
//!
//! At most one alliance exists between two users, whatever the direction it
//! was requested in.

use chrono::{NaiveDateTime, Utc};
use diesel::{
    self,
    backend::Backend,
    deserialize::{self, FromSql},
    serialize::{self, Output, ToSql},
    sql_types::Text,
    BoolExpressionMethods, ExpressionMethods, JoinOnDsl, QueryDsl, RunQueryDsl,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use tracing::info;

use crate::{
    schema::{alliances, users},
    users::User,
    Connection, Error, Result,
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, AsExpression, FromSqlRow, Serialize, Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum AllianceStatus {
    Pending,
    Accepted,
}

impl AllianceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AllianceStatus::Pending => "pending",
            AllianceStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for AllianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllianceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(AllianceStatus::Pending),
            "accepted" => Ok(AllianceStatus::Accepted),
            other => Err(Error::InvalidValue(format!("alliance status {:?}", other))),
        }
    }
}

impl<DB> ToSql<Text, DB> for AllianceStatus
where
    DB: Backend,
    str: ToSql<Text, DB>,
{
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> serialize::Result {
        <str as ToSql<Text, DB>>::to_sql(self.as_str(), out)
    }
}

impl<DB> FromSql<Text, DB> for AllianceStatus
where
    DB: Backend,
    String: FromSql<Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let value = String::from_sql(bytes)?;
        value.parse().map_err(Into::into)
    }
}

/// Which side of an alliance a user is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceRole {
    Sender,
    Receiver,
}

#[derive(Queryable, Identifiable, Clone, Debug, Serialize)]
#[diesel(table_name = alliances)]
pub struct Alliance {
    #[serde(rename = "_id")]
    pub id: i32,
    #[serde(rename = "sender")]
    pub sender_id: i32,
    #[serde(rename = "receiver")]
    pub receiver_id: i32,
    pub status: AllianceStatus,
    #[serde(rename = "createdAt")]
    pub creation_date: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = alliances)]
pub struct NewAlliance {
    pub sender_id: i32,
    pub receiver_id: i32,
}

impl Alliance {
    get!(alliances);
    insert!(alliances, NewAlliance);
    list_by!(alliances, list_received, receiver_id as i32, status as AllianceStatus);

    pub fn is_pending(&self) -> bool {
        self.status == AllianceStatus::Pending
    }

    pub fn role_of(&self, user_id: i32) -> Option<AllianceRole> {
        if self.sender_id == user_id {
            Some(AllianceRole::Sender)
        } else if self.receiver_id == user_id {
            Some(AllianceRole::Receiver)
        } else {
            None
        }
    }

    /// The member of this alliance that isn't `user_id`.
    pub fn other_member(&self, user_id: i32) -> i32 {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// The alliance between two users, in either direction.
    pub fn between(conn: &mut Connection, a: i32, b: i32) -> Result<Alliance> {
        alliances::table
            .filter(
                alliances::sender_id
                    .eq(a)
                    .and(alliances::receiver_id.eq(b))
                    .or(alliances::sender_id.eq(b).and(alliances::receiver_id.eq(a))),
            )
            .first(conn)
            .map_err(Error::from)
    }

    pub fn find_pending(conn: &mut Connection, sender_id: i32, receiver_id: i32) -> Result<Alliance> {
        alliances::table
            .filter(alliances::sender_id.eq(sender_id))
            .filter(alliances::receiver_id.eq(receiver_id))
            .filter(alliances::status.eq(AllianceStatus::Pending))
            .first(conn)
            .map_err(Error::from)
    }

    /// Every alliance `user_id` takes part in, pending or not.
    pub fn list_involving(conn: &mut Connection, user_id: i32) -> Result<Vec<Alliance>> {
        alliances::table
            .filter(
                alliances::sender_id
                    .eq(user_id)
                    .or(alliances::receiver_id.eq(user_id)),
            )
            .order(alliances::id.asc())
            .load::<Alliance>(conn)
            .map_err(Error::from)
    }

    /// Sends an alliance request from `sender_id` to `receiver_id`.
    ///
    /// The unique indexes on the pair reject a second request in either
    /// direction, even when both are sent at the same time.
    pub fn request(conn: &mut Connection, sender_id: i32, receiver_id: i32) -> Result<Alliance> {
        if sender_id == receiver_id {
            return Err(Error::Validation(String::from(
                "You can't forge an alliance with yourself",
            )));
        }
        User::get(conn, receiver_id)?;
        let alliance = Alliance::insert(
            conn,
            NewAlliance {
                sender_id,
                receiver_id,
            },
        )?;
        info!("User {} requested an alliance with {}", sender_id, receiver_id);
        Ok(alliance)
    }

    /// The sender withdraws a request that wasn't answered yet.
    pub fn cancel(conn: &mut Connection, sender_id: i32, receiver_id: i32) -> Result<Alliance> {
        let alliance = Alliance::find_pending(conn, sender_id, receiver_id)?;
        diesel::delete(&alliance).execute(conn)?;
        info!("User {} withdrew their request to {}", sender_id, receiver_id);
        Ok(alliance)
    }

    /// The receiver accepts a pending request.
    pub fn forge(conn: &mut Connection, receiver_id: i32, sender_id: i32) -> Result<Alliance> {
        let alliance = Alliance::find_pending(conn, sender_id, receiver_id)?;
        diesel::update(&alliance)
            .set((
                alliances::status.eq(AllianceStatus::Accepted),
                alliances::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
        info!("Users {} and {} are now allies", sender_id, receiver_id);
        Alliance::get(conn, alliance.id)
    }

    /// The receiver turns a pending request down.
    pub fn reject(conn: &mut Connection, receiver_id: i32, sender_id: i32) -> Result<Alliance> {
        let alliance = Alliance::find_pending(conn, sender_id, receiver_id)?;
        diesel::delete(&alliance).execute(conn)?;
        info!("User {} rejected the request of {}", receiver_id, sender_id);
        Ok(alliance)
    }

    /// Ends an accepted alliance. Either ally may do it.
    pub fn dissolve(conn: &mut Connection, user_id: i32, other_id: i32) -> Result<Alliance> {
        let alliance = Alliance::between(conn, user_id, other_id)?;
        if alliance.is_pending() {
            return Err(Error::NotFound);
        }
        diesel::delete(&alliance).execute(conn)?;
        info!("Users {} and {} are no longer allies", user_id, other_id);
        Ok(alliance)
    }

    /// Users who sent a pending request to `user_id`, oldest request first.
    pub fn pending_senders(conn: &mut Connection, user_id: i32) -> Result<Vec<User>> {
        alliances::table
            .inner_join(users::table.on(users::id.eq(alliances::sender_id)))
            .filter(alliances::receiver_id.eq(user_id))
            .filter(alliances::status.eq(AllianceStatus::Pending))
            .order(alliances::id.asc())
            .select(users::all_columns)
            .load::<User>(conn)
            .map_err(Error::from)
    }

    /// The allies of `user_id`, in the order the alliances were forged.
    pub fn allies(conn: &mut Connection, user_id: i32) -> Result<Vec<User>> {
        let forged = alliances::table
            .filter(
                alliances::sender_id
                    .eq(user_id)
                    .or(alliances::receiver_id.eq(user_id)),
            )
            .filter(alliances::status.eq(AllianceStatus::Accepted))
            .order((alliances::updated_at.asc(), alliances::id.asc()))
            .load::<Alliance>(conn)?;
        let ids = forged
            .iter()
            .map(|a| a.other_member(user_id))
            .collect::<Vec<_>>();
        let mut by_id = User::get_many(conn, &ids)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect::<HashMap<_, _>>();
        Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
    }

    /// Every other user `user_id` isn't allied with yet, along with the
    /// pending request between them, if any.
    pub fn candidates(conn: &mut Connection, user_id: i32) -> Result<Vec<(User, Option<Alliance>)>> {
        let mut by_member = Alliance::list_involving(conn, user_id)?
            .into_iter()
            .map(|a| (a.other_member(user_id), a))
            .collect::<HashMap<_, _>>();
        Ok(User::list_others(conn, user_id)?
            .into_iter()
            .filter_map(|user| match by_member.remove(&user.id) {
                Some(alliance) if !alliance.is_pending() => None,
                alliance => Some((user, alliance)),
            })
            .collect())
    }
}
