use rocket::{http::Status, serde::json::Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::{authorization::Authorization, Api, ApiError};
use concord_models::{
    db_conn::DbConn,
    posts::{NewPost, Post, PostUpdate},
    users::User,
    views::PostView,
    Error,
};

#[derive(Deserialize, Validate)]
pub struct NewPostData {
    #[serde(default)]
    #[validate(length(max = 5000, message = "Your post is too long"))]
    pub message: String,
    #[validate(url(message = "The image must be a link"))]
    pub image: Option<String>,
}

#[derive(Deserialize, Default, Validate)]
#[serde(default)]
pub struct PostData {
    #[validate(length(max = 5000, message = "Your post is too long"))]
    pub message: Option<String>,
    #[validate(url(message = "The image must be a link"))]
    pub image: Option<String>,
}

#[derive(Serialize)]
pub struct PostList {
    pub posts: Vec<PostView>,
}

#[derive(Serialize)]
pub struct PostBody {
    pub post: PostView,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[get("/")]
pub async fn list(auth: Authorization, conn: DbConn) -> Api<PostList> {
    let posts = conn
        .run(|c| {
            let posts = Post::list_recent(c)?;
            PostView::populate(c, posts)
        })
        .await?;
    auth.ok(PostList { posts })
}

#[get("/user/<id>")]
pub async fn list_by_user(id: i32, auth: Authorization, conn: DbConn) -> Api<PostList> {
    let posts = conn
        .run(move |c| {
            let author = User::get(c, id)?;
            let posts = Post::list_by_author(c, author.id)?;
            PostView::populate(c, posts)
        })
        .await?;
    auth.ok(PostList { posts })
}

#[post("/", data = "<data>")]
pub async fn create(auth: Authorization, conn: DbConn, data: Json<NewPostData>) -> Api<PostBody> {
    let mut data = data.into_inner();
    data.image = blank_to_none(data.image);
    data.validate()?;
    if data.message.trim().is_empty() && data.image.is_none() {
        return Err(ApiError::from(Error::Validation(String::from(
            "A post can't be empty",
        ))));
    }

    let author_id = auth.user_id;
    let post = conn
        .run(move |c| {
            let post = Post::insert(
                c,
                NewPost {
                    author_id,
                    message: data.message,
                    image: data.image,
                },
            )?;
            info!("User {} published post {}", author_id, post.id);
            PostView::populate_one(c, post)
        })
        .await?;
    auth.reply(Status::Created, PostBody { post })
}

/// A blank `image` removes the picture, a missing one keeps it.
#[put("/<id>", data = "<data>")]
pub async fn update(
    id: i32,
    auth: Authorization,
    conn: DbConn,
    data: Json<PostData>,
) -> Api<PostBody> {
    let mut data = data.into_inner();
    let remove_image = data
        .image
        .as_deref()
        .map_or(false, |image| image.trim().is_empty());
    data.image = blank_to_none(data.image);
    data.validate()?;
    let changes = PostUpdate {
        message: data.message,
        image: if remove_image {
            Some(None)
        } else {
            data.image.map(Some)
        },
    };

    let user_id = auth.user_id;
    let post = conn
        .run(move |c| {
            let post = Post::get(c, id)?;
            if !post.is_author(user_id) {
                return Err(Error::Forbidden);
            }
            let post = post.update(c, changes)?;
            PostView::populate_one(c, post)
        })
        .await?;
    auth.reply(Status::Accepted, PostBody { post })
}

#[delete("/<id>")]
pub async fn delete(id: i32, auth: Authorization, conn: DbConn) -> Api<PostBody> {
    let user_id = auth.user_id;
    let post = conn
        .run(move |c| {
            let post = Post::get(c, id)?;
            if !post.is_author(user_id) {
                return Err(Error::Forbidden);
            }
            let view = PostView::populate_one(c, post.clone())?;
            post.delete(c)?;
            Ok(view)
        })
        .await?;
    auth.reply(Status::Accepted, PostBody { post })
}
