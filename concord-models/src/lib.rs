#[macro_use]
extern crate diesel;
#[macro_use]
extern crate lazy_static;

use diesel::result::DatabaseErrorKind;

pub use crate::config::CONFIG;

pub type Connection = diesel::SqliteConnection;

/// Everything that can go wrong in a model operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a record with this {0} already exists")]
    Conflict(&'static str),
    #[error("database error: {0}")]
    Db(diesel::result::Error),
    #[error("you are not allowed to do that")]
    Forbidden,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("migrations failed: {0}")]
    Migration(String),
    #[error("not found")]
    NotFound,
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("database task failed: {0}")]
    Task(#[from] rocket::tokio::task::JoinError),
    #[error("authentication failed")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = info.message();
                if message.contains("users.username") {
                    Error::Conflict("username")
                } else if message.contains("users.email") {
                    Error::Conflict("email")
                } else if message.contains("alliances.") || message.contains("alliances_pair") {
                    Error::Conflict("pair of users")
                } else {
                    Error::Db(diesel::result::Error::DatabaseError(
                        DatabaseErrorKind::UniqueViolation,
                        info,
                    ))
                }
            }
            e => Error::Db(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Generates a lookup returning the first row whose columns equal the
/// arguments.
///
/// ```rust,ignore
/// impl Model {
///     find_by!(model_table, name_of_the_function, field1 as String, field2 as i32);
/// }
///
/// let found = Model::name_of_the_function(conn, String::new(), 0)?;
/// ```
macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        pub fn $fn(conn: &mut crate::Connection, $($col: $type),+) -> crate::Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(crate::Error::from)
        }
    };
}

/// Generates a listing of every row whose columns equal the arguments,
/// oldest first.
///
/// ```rust,ignore
/// impl Model {
///     list_by!(model_table, name_of_the_function, field1 as String);
/// }
///
/// let all = Model::name_of_the_function(conn, String::new())?;
/// ```
macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        pub fn $fn(conn: &mut crate::Connection, $($col: $type),+) -> crate::Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .order($table::id.asc())
                .load::<Self>(conn)
                .map_err(crate::Error::from)
        }
    };
}

/// `Model::get(conn, id)`, failing with `Error::NotFound` for unknown ids.
///
/// ```rust,ignore
/// impl Model {
///     get!(model_table);
/// }
///
/// let model = Model::get(conn, 1)?;
/// ```
macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &mut crate::Connection, id: i32) -> crate::Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(crate::Error::from)
        }
    };
}

/// `Model::insert(conn, new)`, returning the stored row.
///
/// ```rust,ignore
/// impl Model {
///     insert!(model_table, NewModelType);
/// }
///
/// let model = Model::insert(conn, NewModelType::new())?;
/// ```
macro_rules! insert {
    ($table:ident, $from:ty) => {
        pub fn insert(conn: &mut crate::Connection, new: $from) -> crate::Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .get_result(conn)
                .map_err(crate::Error::from)
        }
    };
}

pub mod alliances;
pub mod comments;
pub mod config;
pub mod db_conn;
pub mod likes;
pub mod migrations;
pub mod posts;
pub mod schema;
pub mod tokens;
pub mod users;
pub mod views;
