//! JSON shapes returned by the API, and the population that builds them.
//!
//! A post is never sent alone: it comes with its author, its comments (each
//! with its own author and likers) and its likers. Population runs one query
//! per relation for a whole batch of posts, then stitches the rows together
//! in memory.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::{
    alliances::{Alliance, AllianceRole},
    comments::Comment,
    likes::Like,
    posts::Post,
    users::User,
    Connection, Error, Result,
};

/// A user as shown next to something they wrote.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: i32,
    pub username: String,
    pub profile_picture: String,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        UserRef {
            id: user.id,
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Liker {
    #[serde(rename = "_id")]
    pub id: i32,
    pub username: String,
}

impl From<&User> for Liker {
    fn from(user: &User) -> Self {
        Liker {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// A user as listed in alliance screens.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: i32,
    pub firstname: String,
    pub lastname: String,
    pub location: String,
    pub profile_picture: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            location: user.location.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// Everything about a user but their password.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: i32,
    pub email: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub location: String,
    pub profile_picture: String,
    pub bio: String,
    #[serde(rename = "createdAt")]
    pub creation_date: NaiveDateTime,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Profile {
            id: user.id,
            email: user.email,
            username: user.username,
            firstname: user.firstname,
            lastname: user.lastname,
            location: user.location,
            profile_picture: user.profile_picture,
            bio: user.bio,
            creation_date: user.creation_date,
        }
    }
}

/// Another user, and where the current user stands with them.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub user: UserSummary,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alliance_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alliance_role: Option<AllianceRole>,
}

impl Candidate {
    /// `alliance_role` is the role of `viewer_id`, not of `user`.
    pub fn new(viewer_id: i32, user: &User, alliance: Option<&Alliance>) -> Self {
        Candidate {
            user: user.into(),
            status: alliance.map(|a| a.status.as_str()).unwrap_or("none"),
            alliance_id: alliance.map(|a| a.id),
            alliance_role: alliance.and_then(|a| a.role_of(viewer_id)),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: i32,
    pub post_id: i32,
    pub author: UserRef,
    pub message: String,
    pub likes: Vec<Liker>,
    pub is_edited: bool,
    #[serde(rename = "createdAt")]
    pub creation_date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: i32,
    pub author: UserRef,
    pub message: String,
    pub image: Option<String>,
    pub comments: Vec<CommentView>,
    pub likes: Vec<Liker>,
    pub is_edited: bool,
    #[serde(rename = "createdAt")]
    pub creation_date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Rows loaded for a batch of posts and comments, indexed for assembly.
struct Population {
    users: HashMap<i32, User>,
    post_likes: HashMap<i32, Vec<i32>>,
    comment_likes: HashMap<i32, Vec<i32>>,
}

impl Population {
    fn load(conn: &mut Connection, posts: &[Post], comments: &[Comment]) -> Result<Self> {
        let post_ids = posts.iter().map(|p| p.id).collect::<Vec<_>>();
        let comment_ids = comments.iter().map(|c| c.id).collect::<Vec<_>>();
        let likes = Like::list_for(conn, &post_ids, &comment_ids)?;

        let user_ids = posts
            .iter()
            .map(|p| p.author_id)
            .chain(comments.iter().map(|c| c.author_id))
            .chain(likes.iter().map(|l| l.user_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let users = User::get_many(conn, &user_ids)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut post_likes: HashMap<i32, Vec<i32>> = HashMap::new();
        let mut comment_likes: HashMap<i32, Vec<i32>> = HashMap::new();
        for like in likes {
            if let Some(post_id) = like.post_id {
                post_likes.entry(post_id).or_default().push(like.user_id);
            } else if let Some(comment_id) = like.comment_id {
                comment_likes.entry(comment_id).or_default().push(like.user_id);
            }
        }

        Ok(Population {
            users,
            post_likes,
            comment_likes,
        })
    }

    fn user(&self, id: i32) -> Result<&User> {
        self.users.get(&id).ok_or(Error::NotFound)
    }

    fn likers(&self, likes: Option<&Vec<i32>>) -> Result<Vec<Liker>> {
        likes
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|id| self.user(*id).map(Liker::from))
            .collect()
    }

    fn comment(&self, comment: Comment) -> Result<CommentView> {
        Ok(CommentView {
            id: comment.id,
            post_id: comment.post_id,
            author: self.user(comment.author_id)?.into(),
            likes: self.likers(self.comment_likes.get(&comment.id))?,
            message: comment.message,
            is_edited: comment.is_edited,
            creation_date: comment.creation_date,
            updated_at: comment.updated_at,
        })
    }

    fn post(&self, post: Post, comments: Vec<CommentView>) -> Result<PostView> {
        Ok(PostView {
            id: post.id,
            author: self.user(post.author_id)?.into(),
            likes: self.likers(self.post_likes.get(&post.id))?,
            comments,
            message: post.message,
            image: post.image,
            is_edited: post.is_edited,
            creation_date: post.creation_date,
            updated_at: post.updated_at,
        })
    }
}

impl PostView {
    /// Populates a list of posts, keeping their order.
    pub fn populate(conn: &mut Connection, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let post_ids = posts.iter().map(|p| p.id).collect::<Vec<_>>();
        let comments = Comment::list_for_posts(conn, &post_ids)?;
        let population = Population::load(conn, &posts, &comments)?;

        let mut by_post: HashMap<i32, Vec<CommentView>> = HashMap::new();
        for comment in comments {
            by_post
                .entry(comment.post_id)
                .or_default()
                .push(population.comment(comment)?);
        }

        posts
            .into_iter()
            .map(|post| {
                let comments = by_post.remove(&post.id).unwrap_or_default();
                population.post(post, comments)
            })
            .collect()
    }

    pub fn populate_one(conn: &mut Connection, post: Post) -> Result<PostView> {
        PostView::populate(conn, vec![post])?
            .pop()
            .ok_or(Error::NotFound)
    }
}

impl CommentView {
    pub fn populate_one(conn: &mut Connection, comment: Comment) -> Result<CommentView> {
        let population = Population::load(conn, &[], std::slice::from_ref(&comment))?;
        population.comment(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alliances::Alliance;
    use crate::comments::NewComment;
    use crate::likes::LikeTarget;
    use crate::posts::tests::fill_database;
    use crate::tests::db;
    use diesel::Connection as _;

    #[test]
    fn populate_posts() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (posts, users) = fill_database(conn);
            let older = Comment::insert(
                conn,
                NewComment {
                    post_id: posts[0].id,
                    author_id: users[1].id,
                    message: "Welcome!".into(),
                },
            )?;
            let newer = Comment::insert(
                conn,
                NewComment {
                    post_id: posts[0].id,
                    author_id: users[2].id,
                    message: "Hey".into(),
                },
            )?;
            Like::toggle(conn, users[2].id, LikeTarget::Post(posts[0].id))?;
            Like::toggle(conn, users[1].id, LikeTarget::Post(posts[0].id))?;
            Like::toggle(conn, users[0].id, LikeTarget::Comment(older.id))?;

            let recent = Post::list_recent(conn)?;
            let views = PostView::populate(conn, recent)?;
            assert_eq!(views.len(), 3);
            let hello = &views[2];
            assert_eq!(hello.id, posts[0].id);
            assert_eq!(hello.author, UserRef::from(&users[0]));
            assert_eq!(
                hello.comments.iter().map(|c| c.id).collect::<Vec<_>>(),
                vec![newer.id, older.id]
            );
            assert_eq!(hello.comments[0].author.username, "max");
            assert!(hello.comments[0].likes.is_empty());
            assert_eq!(hello.comments[1].likes, vec![Liker::from(&users[0])]);
            assert_eq!(
                hello.likes.iter().map(|l| l.username.as_str()).collect::<Vec<_>>(),
                vec!["max", "jane"]
            );

            let london = &views[1];
            assert!(london.comments.is_empty());
            assert!(london.likes.is_empty());
            assert_eq!(london.image.as_deref(), Some("https://example.com/london.jpg"));
            Ok(())
        });
    }

    #[test]
    fn serialized_shape() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (posts, users) = fill_database(conn);
            Like::toggle(conn, users[1].id, LikeTarget::Post(posts[0].id))?;
            let post = Post::get(conn, posts[0].id)?;
            let view = PostView::populate_one(conn, post)?;
            let json = serde_json::to_value(&view).unwrap();
            assert_eq!(json["_id"], posts[0].id);
            assert_eq!(json["author"]["username"], "john");
            assert_eq!(json["author"]["profilePicture"], "https://example.com/images/john.jpg");
            assert_eq!(json["likes"][0]["username"], "jane");
            assert_eq!(json["isEdited"], false);
            assert!(json["createdAt"].is_string());
            Ok(())
        });
    }

    #[test]
    fn candidate_shape() {
        let conn = &mut db();
        conn.test_transaction::<_, Error, _>(|conn| {
            let (_, users) = fill_database(conn);
            let alliance = Alliance::request(conn, users[2].id, users[1].id)?;
            let json = serde_json::to_value(Candidate::new(users[1].id, &users[2], Some(&alliance)))
                .unwrap();
            assert_eq!(json["_id"], users[2].id);
            assert_eq!(json["firstname"], "Max");
            assert_eq!(json["status"], "pending");
            assert_eq!(json["allianceId"], alliance.id);
            assert_eq!(json["allianceRole"], "receiver");

            let json = serde_json::to_value(Candidate::new(users[1].id, &users[0], None)).unwrap();
            assert_eq!(json["status"], "none");
            assert!(json.get("allianceId").is_none());
            Ok(())
        });
    }
}
