use diesel::{
    r2d2::{ConnectionManager, CustomizeConnection, Error as ConnError, Pool},
    sql_query, RunQueryDsl,
};
use rocket::{
    outcome::{try_outcome, Outcome},
    request::{self, FromRequest, Request},
    tokio::task,
    State,
};

use crate::{Connection, Result, CONFIG};

pub type DbPool = Pool<ConnectionManager<Connection>>;

/// Builds a connection pool for the given database URL.
pub fn init_pool(database_url: &str, max_size: Option<u32>) -> Result<DbPool> {
    let manager = ConnectionManager::<Connection>::new(database_url);
    let mut builder = DbPool::builder().connection_customizer(Box::new(PragmaForeignKey));
    if let Some(max_size) = max_size {
        builder = builder.max_size(max_size);
    }
    Ok(builder.build(manager)?)
}

/// Builds the pool described by the global configuration.
pub fn init_configured_pool() -> Result<DbPool> {
    init_pool(&CONFIG.database_url, CONFIG.db_max_size)
}

/// Request guard giving access to the managed pool.
///
/// Queries are blocking, so they go through [`DbConn::run`] and never touch
/// the async executor's threads.
pub struct DbConn(DbPool);

impl DbConn {
    /// Runs `f` with a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.0.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

/// Fails with an `InternalServerError` status when no pool is managed.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConn {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let pool = try_outcome!(request.guard::<&State<DbPool>>().await);
        Outcome::Success(DbConn(pool.inner().clone()))
    }
}

#[derive(Debug)]
pub struct PragmaForeignKey;

impl CustomizeConnection<Connection, ConnError> for PragmaForeignKey {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), ConnError> {
        sql_query("PRAGMA foreign_keys = ON;")
            .execute(conn)
            .and_then(|_| sql_query("PRAGMA busy_timeout = 5000;").execute(conn))
            .map(|_| ())
            .map_err(ConnError::QueryError)
    }
}
