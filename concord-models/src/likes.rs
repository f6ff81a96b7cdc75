use chrono::NaiveDateTime;
use diesel::{
    self, BoolExpressionMethods, Connection as _, ExpressionMethods, JoinOnDsl, QueryDsl,
    RunQueryDsl,
};
use tracing::debug;

use crate::{
    comments::Comment,
    posts::Post,
    schema::{likes, users},
    users::User,
    Connection, Error, Result,
};

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub user_id: i32,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
}

/// What a like is given to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeTarget {
    Post(i32),
    Comment(i32),
}

impl NewLike {
    pub fn new(user_id: i32, target: LikeTarget) -> Self {
        match target {
            LikeTarget::Post(id) => NewLike {
                user_id,
                post_id: Some(id),
                comment_id: None,
            },
            LikeTarget::Comment(id) => NewLike {
                user_id,
                post_id: None,
                comment_id: Some(id),
            },
        }
    }
}

impl Like {
    get!(likes);
    insert!(likes, NewLike);
    find_by!(likes, find_by_user_on_post, user_id as i32, post_id as i32);
    find_by!(likes, find_by_user_on_comment, user_id as i32, comment_id as i32);

    pub fn target(&self) -> Option<LikeTarget> {
        match (self.post_id, self.comment_id) {
            (Some(id), None) => Some(LikeTarget::Post(id)),
            (None, Some(id)) => Some(LikeTarget::Comment(id)),
            _ => None,
        }
    }

    pub fn find(conn: &mut Connection, user_id: i32, target: LikeTarget) -> Result<Like> {
        match target {
            LikeTarget::Post(id) => Like::find_by_user_on_post(conn, user_id, id),
            LikeTarget::Comment(id) => Like::find_by_user_on_comment(conn, user_id, id),
        }
    }

    /// Likes `target` if `user_id` didn't already, and takes the like back
    /// otherwise. Returns whether the target is liked afterwards.
    pub fn toggle(conn: &mut Connection, user_id: i32, target: LikeTarget) -> Result<bool> {
        conn.transaction::<_, Error, _>(|conn| {
            match target {
                LikeTarget::Post(id) => Post::get(conn, id).map(|_| ())?,
                LikeTarget::Comment(id) => Comment::get(conn, id).map(|_| ())?,
            }
            match Like::find(conn, user_id, target) {
                Ok(like) => {
                    diesel::delete(&like).execute(conn)?;
                    debug!("User {} unliked {:?}", user_id, target);
                    Ok(false)
                }
                Err(Error::NotFound) => {
                    Like::insert(conn, NewLike::new(user_id, target))?;
                    debug!("User {} liked {:?}", user_id, target);
                    Ok(true)
                }
                Err(e) => Err(e),
            }
        })
    }

    /// The users who liked `target`, in the order they did it.
    pub fn likers(conn: &mut Connection, target: LikeTarget) -> Result<Vec<User>> {
        let query = likes::table
            .inner_join(users::table.on(users::id.eq(likes::user_id)))
            .order(likes::id.asc())
            .select(users::all_columns)
            .into_boxed();
        let query = match target {
            LikeTarget::Post(id) => query.filter(likes::post_id.eq(id)),
            LikeTarget::Comment(id) => query.filter(likes::comment_id.eq(id)),
        };
        query.load::<User>(conn).map_err(Error::from)
    }

    /// All the likes given to any of these posts or comments, oldest first.
    pub fn list_for(
        conn: &mut Connection,
        post_ids: &[i32],
        comment_ids: &[i32],
    ) -> Result<Vec<Like>> {
        likes::table
            .filter(
                likes::post_id
                    .eq_any(post_ids.to_vec())
                    .or(likes::comment_id.eq_any(comment_ids.to_vec())),
            )
            .order(likes::id.asc())
            .load::<Like>(conn)
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::NewComment;
    use crate::posts::tests::fill_database;
    use crate::tests::db;

    #[test]
    fn toggle() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (posts, users) = fill_database(conn);
            let target = LikeTarget::Post(posts[0].id);
            assert!(Like::toggle(conn, users[1].id, target)?);
            assert!(Like::toggle(conn, users[2].id, target)?);
            assert_eq!(
                Like::likers(conn, target)?
                    .into_iter()
                    .map(|u| u.username)
                    .collect::<Vec<_>>(),
                vec!["jane", "max"]
            );
            assert_eq!(Like::find(conn, users[1].id, target)?.target(), Some(target));

            assert!(!Like::toggle(conn, users[1].id, target)?);
            assert_eq!(Like::likers(conn, target)?.len(), 1);
            assert!(matches!(
                Like::find(conn, users[1].id, target),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn comments_and_posts_are_separate() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (posts, users) = fill_database(conn);
            let comment = Comment::insert(
                conn,
                NewComment {
                    post_id: posts[0].id,
                    author_id: users[0].id,
                    message: "Replying to myself".into(),
                },
            )?;
            Like::toggle(conn, users[1].id, LikeTarget::Comment(comment.id))?;
            assert!(Like::likers(conn, LikeTarget::Post(posts[0].id))?.is_empty());
            assert_eq!(Like::likers(conn, LikeTarget::Comment(comment.id))?.len(), 1);
            assert_eq!(Like::list_for(conn, &[posts[0].id], &[comment.id])?.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn unknown_target() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (_, users) = fill_database(conn);
            assert!(matches!(
                Like::toggle(conn, users[0].id, LikeTarget::Post(1000)),
                Err(Error::NotFound)
            ));
            assert!(matches!(
                Like::toggle(conn, users[0].id, LikeTarget::Comment(1000)),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }
}
