use chrono::{NaiveDateTime, Utc};
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};
use tracing::info;

use crate::{
    schema::{comments, likes, posts},
    users::User,
    Connection, Error, Result,
};

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub message: String,
    pub image: Option<String>,
    pub is_edited: bool,
    pub creation_date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: i32,
    pub message: String,
    pub image: Option<String>,
}

/// `None` keeps a field as is. `image: Some(None)` removes the image.
#[derive(Default)]
pub struct PostUpdate {
    pub message: Option<String>,
    pub image: Option<Option<String>>,
}

impl Post {
    get!(posts);
    insert!(posts, NewPost);

    /// Every post, newest first.
    pub fn list_recent(conn: &mut Connection) -> Result<Vec<Post>> {
        posts::table
            .order((posts::creation_date.desc(), posts::id.desc()))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn list_by_author(conn: &mut Connection, author_id: i32) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::author_id.eq(author_id))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &mut Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn is_author(&self, user_id: i32) -> bool {
        self.author_id == user_id
    }

    /// Applies `changes` and flags the post as edited.
    pub fn update(&self, conn: &mut Connection, changes: PostUpdate) -> Result<Post> {
        let message = changes.message.unwrap_or_else(|| self.message.clone());
        let image = match changes.image {
            Some(image) => image,
            None => self.image.clone(),
        };
        if message.trim().is_empty() && image.is_none() {
            return Err(Error::Validation(String::from("A post can't be empty")));
        }
        diesel::update(self)
            .set((
                posts::message.eq(message),
                posts::image.eq(image),
                posts::is_edited.eq(true),
                posts::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
        Post::get(conn, self.id)
    }

    /// Deletes the post, its comments, and every like on either of them.
    pub fn delete(&self, conn: &mut Connection) -> Result<()> {
        conn.transaction::<_, Error, _>(|conn| {
            let comment_ids = comments::table
                .filter(comments::post_id.eq(self.id))
                .select(comments::id)
                .load::<i32>(conn)?;
            diesel::delete(likes::table.filter(likes::comment_id.eq_any(comment_ids)))
                .execute(conn)?;
            diesel::delete(likes::table.filter(likes::post_id.eq(self.id))).execute(conn)?;
            diesel::delete(comments::table.filter(comments::post_id.eq(self.id))).execute(conn)?;
            diesel::delete(self).execute(conn)?;
            Ok(())
        })?;
        info!("Deleted post {}", self.id);
        Ok(())
    }
}
