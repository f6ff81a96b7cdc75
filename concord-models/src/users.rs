use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::Deserialize;
use std::borrow::Cow;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::{schema::users, Connection, Error, Result};

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub location: String,
    pub profile_picture: String,
    pub bio: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable, Default)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub location: String,
    pub profile_picture: String,
}

/// A request to open an account, from the API or the CLI.
#[derive(Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters long"))]
    pub password: String,
    #[validate(
        length(min = 1, message = "Username can't be empty"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub profile_picture: String,
}

pub fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    if username.contains(&['<', '>', '&', '@', '\'', '"', ' ', '\n', '\t'][..]) {
        let mut err = ValidationError::new("username_illegal_char");
        err.message = Some(Cow::from(
            "User name is not allowed to contain any of < > & @ ' or \"",
        ));
        Err(err)
    } else {
        Ok(())
    }
}

impl Signup {
    /// Trims and checks the request, then hashes the password.
    pub fn into_new_user(mut self, cost: PasswordCost) -> Result<NewUser> {
        self.username = self.username.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self.validate()?;
        Ok(NewUser {
            hashed_password: User::hash_pass(&self.password, cost)?,
            email: self.email,
            username: self.username,
            firstname: self.firstname,
            lastname: self.lastname,
            location: self.location,
            profile_picture: self.profile_picture,
        })
    }
}

/// Profile fields a user can change themselves. `None` leaves a field as is.
#[derive(AsChangeset, Default)]
#[diesel(table_name = users)]
pub struct ProfileUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.lastname.is_none()
            && self.location.is_none()
            && self.profile_picture.is_none()
            && self.bio.is_none()
    }
}

/// Password hashing work factor, in bcrypt's cost units.
#[derive(Clone, Copy, Debug)]
pub struct PasswordCost(pub u32);

impl User {
    get!(users);
    find_by!(users, find_by_email, email as &str);
    find_by!(users, find_by_username, username as &str);
    insert!(users, NewUser);

    pub fn hash_pass(pass: &str, cost: PasswordCost) -> Result<String> {
        bcrypt::hash(pass, cost.0).map_err(Error::from)
    }

    pub fn auth(&self, pass: &str) -> bool {
        bcrypt::verify(pass, &self.hashed_password).unwrap_or(false)
    }

    /// Finds the user owning this email and checks their password.
    ///
    /// Both an unknown email and a wrong password give `Error::Unauthorized`,
    /// so callers can't tell which one was wrong.
    pub fn login(conn: &mut Connection, email: &str, pass: &str) -> Result<User> {
        match User::find_by_email(conn, email) {
            Ok(user) if user.auth(pass) => Ok(user),
            Ok(_) | Err(Error::NotFound) => Err(Error::Unauthorized),
            Err(e) => Err(e),
        }
    }

    pub fn list_all(conn: &mut Connection) -> Result<Vec<User>> {
        users::table
            .order(users::id.asc())
            .load::<User>(conn)
            .map_err(Error::from)
    }

    pub fn list_others(conn: &mut Connection, id: i32) -> Result<Vec<User>> {
        users::table
            .filter(users::id.ne(id))
            .order(users::id.asc())
            .load::<User>(conn)
            .map_err(Error::from)
    }

    pub fn get_many(conn: &mut Connection, ids: &[i32]) -> Result<Vec<User>> {
        users::table
            .filter(users::id.eq_any(ids))
            .load::<User>(conn)
            .map_err(Error::from)
    }

    pub fn update_profile(&self, conn: &mut Connection, changes: ProfileUpdate) -> Result<User> {
        if changes.is_empty() {
            return User::get(conn, self.id);
        }
        diesel::update(self).set(&changes).execute(conn)?;
        User::get(conn, self.id)
    }

    pub fn reset_password(&self, conn: &mut Connection, hashed_password: String) -> Result<()> {
        diesel::update(self)
            .set(users::hashed_password.eq(hashed_password))
            .execute(conn)?;
        info!("Password of {} was reset", self.username);
        Ok(())
    }

    /// Removes the account. Posts, comments, likes and alliances go with it.
    pub fn delete(&self, conn: &mut Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        info!("Deleted user {}", self.username);
        Ok(())
    }
}
