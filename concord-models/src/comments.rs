use chrono::{NaiveDateTime, Utc};
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};
use tracing::info;

use crate::{
    posts::Post,
    schema::{comments, likes},
    users::User,
    Connection, Error, Result,
};

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub message: String,
    pub is_edited: bool,
    pub creation_date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub message: String,
}

impl Comment {
    get!(comments);
    insert!(comments, NewComment);

    /// The comments of several posts at once, newest first.
    pub fn list_for_posts(conn: &mut Connection, post_ids: &[i32]) -> Result<Vec<Comment>> {
        comments::table
            .filter(comments::post_id.eq_any(post_ids))
            .order((comments::creation_date.desc(), comments::id.desc()))
            .load::<Comment>(conn)
            .map_err(Error::from)
    }

    pub fn get_author(&self, conn: &mut Connection) -> Result<User> {
        User::get(conn, self.author_id)
    }

    pub fn get_post(&self, conn: &mut Connection) -> Result<Post> {
        Post::get(conn, self.post_id)
    }

    /// Comments can be removed by their author, or by the author of the post
    /// they were written on.
    pub fn can_delete(&self, conn: &mut Connection, user_id: i32) -> Result<bool> {
        Ok(self.author_id == user_id || self.get_post(conn)?.is_author(user_id))
    }

    pub fn edit(&self, conn: &mut Connection, message: String) -> Result<Comment> {
        diesel::update(self)
            .set((
                comments::message.eq(message),
                comments::is_edited.eq(true),
                comments::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
        Comment::get(conn, self.id)
    }

    pub fn delete(&self, conn: &mut Connection) -> Result<()> {
        conn.transaction::<_, Error, _>(|conn| {
            diesel::delete(likes::table.filter(likes::comment_id.eq(self.id))).execute(conn)?;
            diesel::delete(self).execute(conn)?;
            Ok(())
        })?;
        info!("Deleted comment {} on post {}", self.id, self.post_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likes::{Like, LikeTarget};
    use crate::posts::tests::fill_database;
    use crate::tests::db;

    #[test]
    fn list_for_posts() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (posts, users) = fill_database(conn);
            let mut ids = vec![];
            for (post, message) in &[(&posts[0], "first"), (&posts[1], "second"), (&posts[0], "third")] {
                ids.push(
                    Comment::insert(
                        conn,
                        NewComment {
                            post_id: post.id,
                            author_id: users[2].id,
                            message: message.to_string(),
                        },
                    )?
                    .id,
                );
            }
            let comments = Comment::list_for_posts(conn, &[posts[0].id])?;
            assert_eq!(
                comments.iter().map(|c| c.id).collect::<Vec<_>>(),
                vec![ids[2], ids[0]]
            );
            assert_eq!(Comment::list_for_posts(conn, &[posts[0].id, posts[1].id])?.len(), 3);
            assert!(Comment::list_for_posts(conn, &[])?.is_empty());
            Ok(())
        });
    }

    #[test]
    fn edit_and_delete() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (posts, users) = fill_database(conn);
            let comment = Comment::insert(
                conn,
                NewComment {
                    post_id: posts[1].id,
                    author_id: users[0].id,
                    message: "Nice picture".into(),
                },
            )?;
            let edited = comment.edit(conn, "Very nice picture".into())?;
            assert!(edited.is_edited);
            assert_eq!(edited.message, "Very nice picture");

            assert!(comment.can_delete(conn, users[0].id)?);
            // users[1] wrote the post
            assert!(comment.can_delete(conn, users[1].id)?);
            assert!(!comment.can_delete(conn, users[2].id)?);

            Like::toggle(conn, users[2].id, LikeTarget::Comment(comment.id))?;
            comment.delete(conn)?;
            assert!(matches!(Comment::get(conn, comment.id), Err(Error::NotFound)));
            assert!(Like::likers(conn, LikeTarget::Post(posts[1].id))?.is_empty());
            Ok(())
        });
    }
}
