use diesel::r2d2::{ConnectionManager, PooledConnection};
use rocket::{
    http::Header,
    local::blocking::{Client, LocalRequest},
};
use serde::Serialize;
use tempfile::TempDir;

use concord_models::{
    db_conn::{init_pool, DbPool},
    migrations,
    tokens::TokenKeys,
    users::{NewUser, PasswordCost, User},
    Connection,
};

pub const SECRET: &[u8] = b"a secret for tests only";

/// A server running on its own database file.
pub struct TestApp {
    pub client: Client,
    pub keys: TokenKeys,
    pub pool: DbPool,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concord.sqlite3");
        let pool = init_pool(path.to_str().unwrap(), Some(4)).unwrap();
        migrations::run_pending(&mut pool.get().unwrap()).unwrap();
        let keys = TokenKeys::new(SECRET, 600);
        let client = Client::tracked(crate::init_rocket(
            pool.clone(),
            keys.clone(),
            PasswordCost(4),
        ))
        .unwrap();
        TestApp {
            client,
            keys,
            pool,
            _dir: dir,
        }
    }

    pub fn conn(&self) -> PooledConnection<ConnectionManager<Connection>> {
        self.pool.get().unwrap()
    }

    /// Creates john, jane and max, who all use "password".
    pub fn fill_database(&self) -> Vec<User> {
        let mut conn = self.conn();
        ["john", "jane", "max"]
            .iter()
            .map(|username| {
                User::insert(
                    &mut conn,
                    NewUser {
                        email: format!("{}@example.com", username),
                        hashed_password: User::hash_pass("password", PasswordCost(4)).unwrap(),
                        username: username.to_string(),
                        firstname: username.to_uppercase(),
                        lastname: String::from("Doe"),
                        location: String::from("Earth"),
                        profile_picture: format!("https://example.com/images/{}.jpg", username),
                    },
                )
                .unwrap()
            })
            .collect()
    }

    pub fn token(&self, user: &User) -> String {
        self.keys.issue(user.id).unwrap()
    }

    fn authorize<'c>(&self, request: LocalRequest<'c>, user: &User) -> LocalRequest<'c> {
        request.header(Header::new(
            "Authorization",
            format!("Bearer {}", self.token(user)),
        ))
    }

    pub fn get(&self, uri: impl Into<String>, user: &User) -> LocalRequest<'_> {
        self.authorize(self.client.get(uri.into()), user)
    }

    pub fn post<T: Serialize>(
        &self,
        uri: impl Into<String>,
        user: &User,
        body: &T,
    ) -> LocalRequest<'_> {
        self.authorize(self.client.post(uri.into()), user).json(body)
    }

    pub fn put<T: Serialize>(
        &self,
        uri: impl Into<String>,
        user: &User,
        body: &T,
    ) -> LocalRequest<'_> {
        self.authorize(self.client.put(uri.into()), user).json(body)
    }

    pub fn delete(&self, uri: impl Into<String>, user: &User) -> LocalRequest<'_> {
        self.authorize(self.client.delete(uri.into()), user)
    }
}
